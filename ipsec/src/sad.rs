// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! Security association database entries.

use crate::algorithm::{CryptoAlgorithm, IntegrityAlgorithm, UnknownAlgorithm};
use crate::dump::IpsecSaDump;
use config::ContextsConfig;
use derive_builder::Builder;
use handle::{Handle, kind};
use naming::{MappingError, MappingResult, MultiNamingContext, reply_for_read, reply_for_write};
use std::fmt::Display;
use std::net::IpAddr;
use std::sync::Arc;
use store::{MappingStore, TxContext};
use tracing::{debug, warn};
use vppapi::{
    IPSEC_PROTO_AH, IPSEC_PROTO_ESP, IpsecApi, IpsecSaDetails, IpsecSadAddDelEntry, NOT_ASSIGNED,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::Inbound, Direction::Outbound];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The protocol of an SA, with its algorithms and keys.
///
/// Keys are never dumped by the dataplane: entries read back carry empty keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityProtocol {
    Esp {
        encryption: CryptoAlgorithm,
        encryption_key: Vec<u8>,
        integrity: IntegrityAlgorithm,
        integrity_key: Vec<u8>,
    },
    Ah {
        integrity: IntegrityAlgorithm,
        integrity_key: Vec<u8>,
    },
}

/// No key goes with a null algorithm.
fn key_for(algorithm_set: bool, key: &[u8]) -> Vec<u8> {
    if algorithm_set { key.to_vec() } else { Vec::new() }
}

impl SecurityProtocol {
    fn fill(&self, request: &mut IpsecSadAddDelEntry) {
        match self {
            SecurityProtocol::Esp {
                encryption,
                encryption_key,
                integrity,
                integrity_key,
            } => {
                request.protocol = IPSEC_PROTO_ESP;
                request.crypto_algorithm = encryption.code();
                request.crypto_key = key_for(*encryption != CryptoAlgorithm::None, encryption_key);
                request.integrity_algorithm = integrity.code();
                request.integrity_key =
                    key_for(*integrity != IntegrityAlgorithm::None, integrity_key);
            }
            SecurityProtocol::Ah {
                integrity,
                integrity_key,
            } => {
                request.protocol = IPSEC_PROTO_AH;
                request.crypto_algorithm = CryptoAlgorithm::None.code();
                request.crypto_key = Vec::new();
                request.integrity_algorithm = integrity.code();
                request.integrity_key =
                    key_for(*integrity != IntegrityAlgorithm::None, integrity_key);
            }
        }
    }

    fn from_details(details: &IpsecSaDetails) -> MappingResult<Self> {
        let illegal =
            |e: UnknownAlgorithm| MappingError::IllegalState(format!("SA {}: {e}", details.sa_id));
        let integrity = IntegrityAlgorithm::try_from(details.integ_alg).map_err(illegal)?;
        match details.protocol {
            IPSEC_PROTO_ESP => Ok(SecurityProtocol::Esp {
                encryption: CryptoAlgorithm::try_from(details.crypto_alg).map_err(illegal)?,
                encryption_key: Vec::new(),
                integrity,
                integrity_key: Vec::new(),
            }),
            IPSEC_PROTO_AH => Ok(SecurityProtocol::Ah {
                integrity,
                integrity_key: Vec::new(),
            }),
            other => Err(MappingError::IllegalState(format!(
                "SA {} has unknown protocol {other}",
                details.sa_id
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tunnel {
    pub src: IpAddr,
    pub dst: IpAddr,
}

/// An SA. `sad_id` is the id the dataplane knows it by, chosen by the caller.
#[derive(Builder, Debug, Clone, PartialEq, Eq)]
#[builder(setter(into))]
pub struct SadEntry {
    pub direction: Direction,
    pub spi: u32,
    pub sad_id: u32,
    pub protocol: SecurityProtocol,
    #[builder(default)]
    pub anti_replay: bool,
    /// Tunnel mode endpoints. Transport mode if unset.
    #[builder(setter(into, strip_option), default)]
    pub tunnel: Option<Tunnel>,
}

impl SadEntry {
    fn request(&self, is_add: bool, sad_id: u32) -> IpsecSadAddDelEntry {
        let mut request = IpsecSadAddDelEntry {
            is_add,
            sad_id,
            spi: self.spi,
            use_anti_replay: self.anti_replay,
            is_tunnel: self.tunnel.is_some(),
            tunnel_src: self.tunnel.map(|t| t.src),
            tunnel_dst: self.tunnel.map(|t| t.dst),
            ..Default::default()
        };
        self.protocol.fill(&mut request);
        request
    }
}

pub struct SadEntryWriter<A: ?Sized> {
    api: Arc<A>,
    sads: MultiNamingContext<kind::SadEntry>,
}

impl<A: IpsecApi + ?Sized> SadEntryWriter<A> {
    pub fn new(api: Arc<A>, sads: MultiNamingContext<kind::SadEntry>) -> Self {
        Self { api, sads }
    }

    pub fn from_config(api: Arc<A>, config: &ContextsConfig) -> Self {
        Self::new(api, MultiNamingContext::from_config(&config.ipsec_sad))
    }

    #[must_use]
    pub fn sads(&self) -> &MultiNamingContext<kind::SadEntry> {
        &self.sads
    }

    /// Install `entry` and map its direction and SPI to its SA id.
    ///
    /// # Errors
    ///
    /// [`MappingError::InvalidArgument`] if the SA id is below the start index of the context,
    /// [`MappingError::WriteFailed`] if the dataplane refuses the SA.
    pub fn create<S: MappingStore + ?Sized>(
        &self,
        entry: &SadEntry,
        store: &mut S,
    ) -> MappingResult<Handle<kind::SadEntry>> {
        if entry.sad_id < self.sads.start_index() {
            return Err(MappingError::InvalidArgument(format!(
                "SA id {} is below {}, the first id of context {}",
                entry.sad_id,
                self.sads.start_index(),
                self.sads.instance_name()
            )));
        }
        reply_for_write(
            self.api
                .ipsec_sad_add_del_entry(&entry.request(true, entry.sad_id)),
            &format!("create SA {}/{}", entry.direction, entry.spi),
        )?;
        let sad_id = Handle::from_raw(entry.sad_id);
        self.sads.add_child(
            entry.direction.as_str(),
            sad_id,
            &entry.spi.to_string(),
            store,
        )?;
        debug!("Created SA {}/{} as {sad_id}", entry.direction, entry.spi);
        Ok(sad_id)
    }

    /// SAs can not be modified in place: `before` is removed, then `after` installed.
    pub fn update<S: MappingStore + ?Sized>(
        &self,
        before: &SadEntry,
        after: &SadEntry,
        store: &mut S,
    ) -> MappingResult<Handle<kind::SadEntry>> {
        self.delete(before, store)?;
        self.create(after, store)
    }

    /// Remove the SA mapped to the direction and SPI of `entry`, and unmap it.
    ///
    /// # Errors
    ///
    /// [`MappingError::NotFound`] if the SA is not mapped,
    /// [`MappingError::WriteFailed`] if the dataplane fails to remove it.
    pub fn delete<S: MappingStore + ?Sized>(
        &self,
        entry: &SadEntry,
        store: &mut S,
    ) -> MappingResult<()> {
        let parent = entry.direction.as_str();
        let spi = entry.spi.to_string();
        let sad_id = self.sads.get_index(parent, &spi, store)?;
        if sad_id.into_raw() != entry.sad_id {
            warn!(
                "SA {parent}/{spi} is mapped to {sad_id}, not {}: deleting {sad_id}",
                entry.sad_id
            );
        }
        reply_for_write(
            self.api
                .ipsec_sad_add_del_entry(&entry.request(false, sad_id.into_raw())),
            &format!("delete SA {parent}/{spi}"),
        )?;
        debug!("Deleted SA {parent}/{spi} ({sad_id})");
        self.sads.remove_child(parent, &spi, store)
    }
}

pub struct SadEntryReader<A: ?Sized> {
    api: Arc<A>,
    sads: MultiNamingContext<kind::SadEntry>,
}

impl<A: IpsecApi + ?Sized> SadEntryReader<A> {
    pub fn new(api: Arc<A>, sads: MultiNamingContext<kind::SadEntry>) -> Self {
        Self { api, sads }
    }

    pub fn from_config(api: Arc<A>, config: &ContextsConfig) -> Self {
        Self::new(api, MultiNamingContext::from_config(&config.ipsec_sad))
    }

    fn dump<S: MappingStore>(
        &self,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Arc<Vec<IpsecSaDetails>>> {
        tx.cache_mut()
            .get_or_dump::<IpsecSaDump, _>(&NOT_ASSIGNED, |sa_id| {
                reply_for_read(self.api.ipsec_sa_dump(*sa_id), "dump IPsec SAs")
            })
    }

    /// The direction and SPI of every mapped SA the dataplane has.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if a mapped key is not an SPI.
    pub fn keys<S: MappingStore>(
        &self,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Vec<(Direction, u32)>> {
        let dump = self.dump(tx)?;
        let mut keys = Vec::new();
        for direction in Direction::ALL {
            for (key, sad_id) in self.sads.children(direction.as_str(), tx.mapping())? {
                let spi = key.parse::<u32>().map_err(|_| {
                    MappingError::IllegalState(format!(
                        "Mapping {direction}/{key} of context {} is not keyed by an SPI",
                        self.sads.instance_name()
                    ))
                })?;
                if dump.iter().any(|sa| sa.sa_id == sad_id.into_raw()) {
                    keys.push((direction, spi));
                }
            }
        }
        Ok(keys)
    }

    /// Read the SA with `spi` in `direction`, if it is mapped and the dataplane has it.
    ///
    /// # Errors
    ///
    /// [`MappingError::IllegalState`] if the SA found does not match the mapping or can not be
    /// decoded.
    pub fn read<S: MappingStore>(
        &self,
        direction: Direction,
        spi: u32,
        tx: &mut TxContext<S>,
    ) -> MappingResult<Option<SadEntry>> {
        let sad_id = match self
            .sads
            .get_index(direction.as_str(), &spi.to_string(), tx.mapping())
        {
            Ok(sad_id) => sad_id,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };
        let dump = self.dump(tx)?;
        let Some(details) = dump.iter().find(|sa| sa.sa_id == sad_id.into_raw()) else {
            return Ok(None);
        };
        if details.spi != spi {
            return Err(MappingError::IllegalState(format!(
                "SA {direction}/{spi} is mapped to {sad_id}, which has SPI {}",
                details.spi
            )));
        }
        let tunnel = match (details.is_tunnel, details.tunnel_src, details.tunnel_dst) {
            (false, _, _) => None,
            (true, Some(src), Some(dst)) => Some(Tunnel { src, dst }),
            (true, _, _) => {
                return Err(MappingError::IllegalState(format!(
                    "Tunnel SA {sad_id} has no endpoints"
                )));
            }
        };
        Ok(Some(SadEntry {
            direction,
            spi,
            sad_id: details.sa_id,
            protocol: SecurityProtocol::from_details(details)?,
            anti_replay: details.use_anti_replay,
            tunnel,
        }))
    }
}
