use crate::{BindingError, BindingHints, BindingKind, ConnectionDescriptor, ConnectionInfo, Port};

fn check_protocols(port: &Port, peer: &Port) -> Result<(), BindingError> {
    if std::ptr::eq(port, peer) {
        return Err(BindingError::SelfBinding {
            port: port.full_name(),
        });
    }
    if port.protocol() != peer.protocol() {
        return Err(BindingError::ProtocolMismatch {
            port: port.full_name(),
            peer: peer.full_name(),
            port_protocol: port.protocol(),
            peer_protocol: peer.protocol(),
        });
    }
    Ok(())
}

/// Binds two sibling ports.
///
/// Protocols are compared before any strategy runs. Candidate strategy pairs of the same family
/// are then tried in declaration order. The first pair that binds wins and the first pair that
/// fails ends the search with its error; later pairs are not tried. A failed attempt leaves no
/// trace.
pub fn bind_peer(
    port: &Port,
    peer: &Port,
    hints: &BindingHints,
) -> Result<ConnectionInfo, BindingError> {
    check_protocols(port, peer)?;

    for ours in port.strategies() {
        for theirs in peer.strategies() {
            let Some(result) = ours.bind_peer(theirs, hints) else {
                continue;
            };
            match result {
                Ok(info) => {
                    tracing::debug!(
                        port = %port.full_name(),
                        peer = %peer.full_name(),
                        protocol = %port.protocol(),
                        %info,
                        "ports bound"
                    );
                    record(port, peer, BindingKind::Peer, ours.mode(), theirs.mode(), &info);
                    return Ok(info);
                }
                Err(err) => {
                    tracing::warn!(
                        port = %port.full_name(),
                        peer = %peer.full_name(),
                        %err,
                        "error while binding"
                    );
                    return Err(err);
                }
            }
        }
    }

    Err(BindingError::NotConnectable {
        port: port.full_name(),
        peer: peer.full_name(),
    })
}

/// Binds `child` to the same-protocol port of its composite parent, so the child port is
/// reachable through the parent's bindings.
///
/// Strategy pairs are tried as in [`bind_peer`]: the first success or the first error ends the
/// search.
pub fn bind_hierarchical(child: &Port, parent: &Port) -> Result<ConnectionInfo, BindingError> {
    check_protocols(child, parent)?;

    for ours in child.strategies() {
        for theirs in parent.strategies() {
            let Some(result) = ours.bind_hierarchical(theirs) else {
                continue;
            };
            match result {
                Ok(info) => {
                    tracing::debug!(
                        port = %child.full_name(),
                        parent = %parent.full_name(),
                        protocol = %child.protocol(),
                        "port delegated to parent"
                    );
                    record(
                        child,
                        parent,
                        BindingKind::Hierarchical,
                        ours.mode(),
                        theirs.mode(),
                        &info,
                    );
                    return Ok(info);
                }
                Err(err) if err.is_hierarchical_type_mismatch() => {
                    tracing::warn!(
                        port = %child.full_name(),
                        parent = %parent.full_name(),
                        %err,
                        "not hierarchically connectable"
                    );
                    return Err(err);
                }
                Err(err) => {
                    tracing::warn!(
                        port = %child.full_name(),
                        parent = %parent.full_name(),
                        %err,
                        "error while hierarchical binding"
                    );
                    return Err(err);
                }
            }
        }
    }

    Err(BindingError::NotConnectable {
        port: child.full_name(),
        peer: parent.full_name(),
    })
}

fn record(
    port: &Port,
    peer: &Port,
    kind: BindingKind,
    port_mode: &'static str,
    peer_mode: &'static str,
    info: &ConnectionInfo,
) {
    port.record(ConnectionDescriptor {
        peer: peer.full_name(),
        kind,
        protocol: port.protocol(),
        mode: port_mode,
        info: info.clone(),
    });
    peer.record(ConnectionDescriptor {
        peer: port.full_name(),
        kind,
        protocol: peer.protocol(),
        mode: peer_mode,
        info: info.clone(),
    });
}
