use crossbeam::channel::TrySendError;

use crate::reload::message::ReloadMessage;

use super::ReloadHub;

impl ReloadHub {
    /// Push `msg` into every registered connection's queue.
    ///
    /// Returns how many connections will receive it. Never blocks on a
    /// socket: a full queue already holds a reload for that client, and a
    /// queue whose connection thread has exited is dropped from the
    /// registry.
    pub fn broadcast(&self, msg: &ReloadMessage) -> usize {
        let mut clients = self.clients.lock();

        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            return 0;
        }

        let mut delivered = 0;
        clients.retain(|id, client| match client.tx.try_send(*msg) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                crate::debug!("reload"; "client {} already has a pending reload", id);
                delivered += 1;
                true
            }
            Err(TrySendError::Disconnected(_)) => {
                crate::debug!("reload"; "client {} gone{}", id,
                    client.peer.map(|p| format!(" ({p})")).unwrap_or_default());
                false
            }
        });

        crate::debug!("reload"; "broadcast to {} clients", delivered);
        delivered
    }
}
