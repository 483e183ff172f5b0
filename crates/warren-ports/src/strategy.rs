use crate::{
    BindingError, BindingHints, BusStrategy, CharStreamStrategy, ChipSelectStrategy,
    ConnectionInfo, MultiDropStrategy, ProtocolKind,
};

/// A port's negotiation policy, one variant per protocol family.
///
/// Binding only ever pairs strategies of the same family; the binder checks port protocols before
/// any strategy runs, and the pairwise methods here answer `None` for mixed families.
#[derive(Clone)]
pub enum ConnectionStrategy {
    Bus(BusStrategy),
    CharStream(CharStreamStrategy),
    MultiDrop(MultiDropStrategy),
    ChipSelect(ChipSelectStrategy),
}

impl ConnectionStrategy {
    pub fn protocol(&self) -> ProtocolKind {
        match self {
            ConnectionStrategy::Bus(_) => ProtocolKind::Bus,
            ConnectionStrategy::CharStream(_) => ProtocolKind::CharStream,
            ConnectionStrategy::MultiDrop(_) => ProtocolKind::MultiDrop,
            ConnectionStrategy::ChipSelect(_) => ProtocolKind::ChipSelect,
        }
    }

    /// Role this strategy plays, for diagnostics.
    pub fn mode(&self) -> &'static str {
        match self {
            ConnectionStrategy::Bus(s) => s.mode(),
            ConnectionStrategy::CharStream(_) => "endpoint",
            ConnectionStrategy::MultiDrop(s) => s.mode(),
            ConnectionStrategy::ChipSelect(s) => s.mode(),
        }
    }

    pub(crate) fn bind_peer(
        &self,
        peer: &ConnectionStrategy,
        hints: &BindingHints,
    ) -> Option<Result<ConnectionInfo, BindingError>> {
        use ConnectionStrategy::*;

        Some(match (self, peer) {
            (Bus(a), Bus(b)) => a.bind_peer(b, hints),
            (CharStream(a), CharStream(b)) => a.bind_peer(b),
            (MultiDrop(a), MultiDrop(b)) => a.bind_peer(b),
            (ChipSelect(a), ChipSelect(b)) => a.bind_peer(b, hints),
            _ => return None,
        })
    }

    pub(crate) fn bind_hierarchical(
        &self,
        parent: &ConnectionStrategy,
    ) -> Option<Result<ConnectionInfo, BindingError>> {
        use ConnectionStrategy::*;

        Some(match (self, parent) {
            (Bus(a), Bus(b)) => a.bind_hierarchical(b),
            (CharStream(a), CharStream(b)) => a.bind_hierarchical(b),
            (MultiDrop(a), MultiDrop(b)) => a.bind_hierarchical(b),
            (ChipSelect(a), ChipSelect(b)) => a.bind_hierarchical(b),
            _ => return None,
        })
    }
}

impl From<BusStrategy> for ConnectionStrategy {
    fn from(s: BusStrategy) -> Self {
        ConnectionStrategy::Bus(s)
    }
}

impl From<CharStreamStrategy> for ConnectionStrategy {
    fn from(s: CharStreamStrategy) -> Self {
        ConnectionStrategy::CharStream(s)
    }
}

impl From<MultiDropStrategy> for ConnectionStrategy {
    fn from(s: MultiDropStrategy) -> Self {
        ConnectionStrategy::MultiDrop(s)
    }
}

impl From<ChipSelectStrategy> for ConnectionStrategy {
    fn from(s: ChipSelectStrategy) -> Self {
        ConnectionStrategy::ChipSelect(s)
    }
}
