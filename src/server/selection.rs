//! Server selection policy
//!
//! Decides what to do with the servers found by one discovery round: none is
//! an error, one is bound automatically, several need someone to choose.

use serde::Serialize;

use super::discovery::DiscoveryError;
use crate::models::DiscoveredServer;

/// Outcome of applying the selection policy to a discovery round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "servers", rename_all = "lowercase")]
pub enum ServerChoice {
    /// Exactly one server answered; bind it
    Single(DiscoveredServer),
    /// Several servers answered; an external chooser must pick one
    Ambiguous(Vec<DiscoveredServer>),
}

/// Apply the selection policy to the servers of one round
pub fn select_server(mut servers: Vec<DiscoveredServer>) -> Result<ServerChoice, DiscoveryError> {
    match servers.len() {
        0 => Err(DiscoveryError::NoServerFound),
        1 => Ok(ServerChoice::Single(servers.remove(0))),
        _ => Ok(ServerChoice::Ambiguous(servers)),
    }
}

/// Picks one of several discovered servers, usually by asking the user
pub trait ServerChooser {
    /// Return the index of the chosen label, or `None` if cancelled
    fn choose(&self, labels: &[String]) -> Option<usize>;
}

/// Chooser with a pre-made answer (e.g. from a command-line flag)
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexChooser(pub Option<usize>);

impl ServerChooser for IndexChooser {
    fn choose(&self, labels: &[String]) -> Option<usize> {
        self.0.filter(|&i| i < labels.len())
    }
}

/// Resolve a selection to one server, asking `chooser` when ambiguous
pub fn resolve_choice(choice: ServerChoice, chooser: &dyn ServerChooser) -> Result<DiscoveredServer, DiscoveryError> {
    match choice {
        ServerChoice::Single(server) => Ok(server),
        ServerChoice::Ambiguous(mut servers) => {
            let labels: Vec<String> = servers.iter().map(|s| s.label().to_string()).collect();
            match chooser.choose(&labels) {
                Some(i) if i < servers.len() => Ok(servers.swap_remove(i)),
                _ => Err(DiscoveryError::Cancelled),
            }
        }
    }
}
