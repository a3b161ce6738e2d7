//! # Blocks
//!
//! Apricot blocks carry no timestamp; chain time moves only through
//! `AdvanceTime` proposals. Banff blocks are timestamped and advance chain
//! time themselves.
//!
//! Transactions travel as their signed bytes so a parsed block re-encodes
//! to exactly the bytes it was parsed from.

use serde::{Deserialize, Serialize};
use shared_types::{BlockId, Codec, CodecError, Id, Tx};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    ApricotStandard { txs: Vec<Tx> },
    ApricotProposal { tx: Tx },
    ApricotAtomic { tx: Tx },
    ApricotCommit,
    ApricotAbort,
    BanffStandard { timestamp: u64, txs: Vec<Tx> },
    /// Decision transactions are applied before the proposal is decided.
    BanffProposal {
        timestamp: u64,
        decision_txs: Vec<Tx>,
        tx: Tx,
    },
    BanffCommit { timestamp: u64 },
    BanffAbort { timestamp: u64 },
}

/// Which outcome of a proposal block an option block selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Commit,
    Abort,
}

#[derive(Serialize, Deserialize)]
enum WireBody {
    ApricotStandard { txs: Vec<Vec<u8>> },
    ApricotProposal { tx: Vec<u8> },
    ApricotAtomic { tx: Vec<u8> },
    ApricotCommit,
    ApricotAbort,
    BanffStandard { timestamp: u64, txs: Vec<Vec<u8>> },
    BanffProposal {
        timestamp: u64,
        decision_txs: Vec<Vec<u8>>,
        tx: Vec<u8>,
    },
    BanffCommit { timestamp: u64 },
    BanffAbort { timestamp: u64 },
}

#[derive(Serialize, Deserialize)]
struct WireBlock {
    parent_id: BlockId,
    height: u64,
    body: WireBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    parent_id: BlockId,
    height: u64,
    body: BlockBody,
    bytes: Vec<u8>,
}

fn tx_bytes(txs: &[Tx]) -> Vec<Vec<u8>> {
    txs.iter().map(|tx| tx.bytes().to_vec()).collect()
}

fn parse_txs(txs: &[Vec<u8>], codec: &Codec) -> Result<Vec<Tx>, CodecError> {
    txs.iter().map(|bytes| Tx::parse(bytes, codec)).collect()
}

impl Block {
    pub fn new(
        parent_id: BlockId,
        height: u64,
        body: BlockBody,
        codec: &Codec,
    ) -> Result<Self, CodecError> {
        let wire = WireBlock {
            parent_id,
            height,
            body: match &body {
                BlockBody::ApricotStandard { txs } => WireBody::ApricotStandard {
                    txs: tx_bytes(txs),
                },
                BlockBody::ApricotProposal { tx } => WireBody::ApricotProposal {
                    tx: tx.bytes().to_vec(),
                },
                BlockBody::ApricotAtomic { tx } => WireBody::ApricotAtomic {
                    tx: tx.bytes().to_vec(),
                },
                BlockBody::ApricotCommit => WireBody::ApricotCommit,
                BlockBody::ApricotAbort => WireBody::ApricotAbort,
                BlockBody::BanffStandard { timestamp, txs } => WireBody::BanffStandard {
                    timestamp: *timestamp,
                    txs: tx_bytes(txs),
                },
                BlockBody::BanffProposal {
                    timestamp,
                    decision_txs,
                    tx,
                } => WireBody::BanffProposal {
                    timestamp: *timestamp,
                    decision_txs: tx_bytes(decision_txs),
                    tx: tx.bytes().to_vec(),
                },
                BlockBody::BanffCommit { timestamp } => WireBody::BanffCommit {
                    timestamp: *timestamp,
                },
                BlockBody::BanffAbort { timestamp } => WireBody::BanffAbort {
                    timestamp: *timestamp,
                },
            },
        };
        let bytes = codec.marshal(&wire)?;
        Ok(Self {
            id: Id::hash(&bytes),
            parent_id,
            height,
            body,
            bytes,
        })
    }

    pub fn parse(bytes: &[u8], codec: &Codec) -> Result<Self, CodecError> {
        let wire: WireBlock = codec.unmarshal(bytes)?;
        let body = match wire.body {
            WireBody::ApricotStandard { txs } => BlockBody::ApricotStandard {
                txs: parse_txs(&txs, codec)?,
            },
            WireBody::ApricotProposal { tx } => BlockBody::ApricotProposal {
                tx: Tx::parse(&tx, codec)?,
            },
            WireBody::ApricotAtomic { tx } => BlockBody::ApricotAtomic {
                tx: Tx::parse(&tx, codec)?,
            },
            WireBody::ApricotCommit => BlockBody::ApricotCommit,
            WireBody::ApricotAbort => BlockBody::ApricotAbort,
            WireBody::BanffStandard { timestamp, txs } => BlockBody::BanffStandard {
                timestamp,
                txs: parse_txs(&txs, codec)?,
            },
            WireBody::BanffProposal {
                timestamp,
                decision_txs,
                tx,
            } => BlockBody::BanffProposal {
                timestamp,
                decision_txs: parse_txs(&decision_txs, codec)?,
                tx: Tx::parse(&tx, codec)?,
            },
            WireBody::BanffCommit { timestamp } => BlockBody::BanffCommit { timestamp },
            WireBody::BanffAbort { timestamp } => BlockBody::BanffAbort { timestamp },
        };
        Ok(Self {
            id: Id::hash(bytes),
            parent_id: wire.parent_id,
            height: wire.height,
            body,
            bytes: bytes.to_vec(),
        })
    }

    /// The commit or abort child of a proposal block.
    pub fn option(
        proposal: &Block,
        kind: OptionKind,
        codec: &Codec,
    ) -> Result<Self, CodecError> {
        let body = match (proposal.timestamp(), kind) {
            (Some(timestamp), OptionKind::Commit) => BlockBody::BanffCommit { timestamp },
            (Some(timestamp), OptionKind::Abort) => BlockBody::BanffAbort { timestamp },
            (None, OptionKind::Commit) => BlockBody::ApricotCommit,
            (None, OptionKind::Abort) => BlockBody::ApricotAbort,
        };
        Self::new(proposal.id, proposal.height + 1, body, codec)
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn parent_id(&self) -> BlockId {
        self.parent_id
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn body(&self) -> &BlockBody {
        &self.body
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> &'static str {
        match self.body {
            BlockBody::ApricotStandard { .. } => "apricot_standard",
            BlockBody::ApricotProposal { .. } => "apricot_proposal",
            BlockBody::ApricotAtomic { .. } => "apricot_atomic",
            BlockBody::ApricotCommit => "apricot_commit",
            BlockBody::ApricotAbort => "apricot_abort",
            BlockBody::BanffStandard { .. } => "banff_standard",
            BlockBody::BanffProposal { .. } => "banff_proposal",
            BlockBody::BanffCommit { .. } => "banff_commit",
            BlockBody::BanffAbort { .. } => "banff_abort",
        }
    }

    /// Declared chain time. `None` for Apricot blocks.
    pub fn timestamp(&self) -> Option<u64> {
        match self.body {
            BlockBody::BanffStandard { timestamp, .. }
            | BlockBody::BanffProposal { timestamp, .. }
            | BlockBody::BanffCommit { timestamp }
            | BlockBody::BanffAbort { timestamp } => Some(timestamp),
            BlockBody::ApricotStandard { .. }
            | BlockBody::ApricotProposal { .. }
            | BlockBody::ApricotAtomic { .. }
            | BlockBody::ApricotCommit
            | BlockBody::ApricotAbort => None,
        }
    }

    /// Transactions applied when this block itself is accepted.
    pub fn decision_txs(&self) -> &[Tx] {
        match &self.body {
            BlockBody::ApricotStandard { txs } | BlockBody::BanffStandard { txs, .. } => txs,
            BlockBody::BanffProposal { decision_txs, .. } => decision_txs,
            BlockBody::ApricotAtomic { tx } => std::slice::from_ref(tx),
            _ => &[],
        }
    }

    pub fn proposal_tx(&self) -> Option<&Tx> {
        match &self.body {
            BlockBody::ApricotProposal { tx } | BlockBody::BanffProposal { tx, .. } => Some(tx),
            _ => None,
        }
    }

    pub fn option_kind(&self) -> Option<OptionKind> {
        match self.body {
            BlockBody::ApricotCommit | BlockBody::BanffCommit { .. } => Some(OptionKind::Commit),
            BlockBody::ApricotAbort | BlockBody::BanffAbort { .. } => Some(OptionKind::Abort),
            _ => None,
        }
    }

    /// Every transaction in the block, decisions first.
    pub fn txs(&self) -> impl Iterator<Item = &Tx> {
        self.decision_txs().iter().chain(self.proposal_tx())
    }
}
