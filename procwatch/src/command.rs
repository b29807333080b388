//! Remote directive execution
//!
//! The server answers an upload with a two-element array `[ok, payload]`.
//! When `ok` is false the payload is an error message for the operator.
//! When it is true the payload may carry `kill_black_processes`, a list of
//! ids assigned during this run's numbering; each id that maps to a process
//! entry gets that process SIGKILLed.

#![allow(unsafe_code)] // kill() requires unsafe

use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::io;

use crate::domain::{EntryId, Pid};
use crate::graph::GraphSession;

/// Payload field listing the ids to terminate
pub const KILL_DIRECTIVE: &str = "kill_black_processes";

/// Decoded server answer: success flag and payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerResponse(pub bool, pub Value);

impl ServerResponse {
    /// Decode a response value.
    ///
    /// `null` and empty arrays or objects carry no directive and decode to `None`.
    ///
    /// # Errors
    /// Returns an error if the value is not a `[bool, payload]` pair.
    pub fn from_value(value: Value) -> Result<Option<Self>, serde_json::Error> {
        let empty = match &value {
            Value::Null => true,
            Value::Array(items) => items.is_empty(),
            Value::Object(fields) => fields.is_empty(),
            _ => false,
        };
        if empty {
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }
}

/// Delivers termination signals
pub trait Signaller {
    /// Terminate the process `pid`.
    ///
    /// # Errors
    /// Returns the OS error if the signal could not be delivered.
    fn terminate(&mut self, pid: Pid) -> io::Result<()>;
}

/// Sends SIGKILL via `kill(2)`
#[derive(Debug, Default, Clone, Copy)]
pub struct SigKill;

impl Signaller for SigKill {
    fn terminate(&mut self, pid: Pid) -> io::Result<()> {
        if unsafe { libc::kill(pid.0, libc::SIGKILL) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

/// What a directive caused
#[derive(Debug, Default)]
pub struct CommandOutcome {
    /// Message from a failed response
    pub server_error: Option<String>,
    /// Processes a signal was delivered to
    pub signalled: Vec<Pid>,
    /// Ids not assigned in this run
    pub unknown_ids: usize,
    /// Ids naming library entries, which have no process to signal
    pub skipped_libraries: Vec<EntryId>,
    /// Directive entries that were not integers
    pub malformed: usize,
    pub delivery_failures: Vec<(Pid, io::Error)>,
}

/// Act on a server response using the ids numbered in `session`.
///
/// Nothing is retried: a signal that cannot be delivered is logged and
/// recorded in the outcome.
pub fn execute_directive<S: Signaller + ?Sized>(
    response: &ServerResponse,
    session: &GraphSession,
    signaller: &mut S,
) -> CommandOutcome {
    let mut outcome = CommandOutcome::default();
    let ServerResponse(ok, payload) = response;

    if !ok {
        let message = match payload {
            Value::String(message) => message.clone(),
            other => other.to_string(),
        };
        error!("server error: {message}");
        outcome.server_error = Some(message);
        return outcome;
    }

    let Some(directive) = payload.get(KILL_DIRECTIVE) else {
        debug!("Response carries no {KILL_DIRECTIVE} directive");
        return outcome;
    };
    let Some(ids) = directive.as_array() else {
        warn!("Ignoring {KILL_DIRECTIVE}: expected a list of ids, got {directive}");
        return outcome;
    };

    for raw in ids {
        let id = match (raw.as_u64(), raw.as_i64()) {
            (Some(id), _) => u32::try_from(id).ok().map(EntryId),
            (None, Some(_)) => None,
            (None, None) => {
                warn!("Ignoring non-integer id {raw} in {KILL_DIRECTIVE}");
                outcome.malformed += 1;
                continue;
            }
        };
        let Some(entry) = id.and_then(|id| session.resolve_id(id)) else {
            debug!("Directive id {raw} was not assigned in this run");
            outcome.unknown_ids += 1;
            continue;
        };
        let Some(pid) = entry.pid else {
            debug!("Directive id {raw} names library {}, nothing to signal", entry.path);
            outcome.skipped_libraries.extend(id);
            continue;
        };

        match signaller.terminate(pid) {
            Ok(()) => {
                info!("Killed {pid} ({})", entry.path);
                outcome.signalled.push(pid);
            }
            Err(e) => {
                warn!("Failed to kill {pid} ({}): {e}", entry.path);
                outcome.delivery_failures.push((pid, e));
            }
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSignaller {
        sent: Vec<Pid>,
        refuse: bool,
    }

    impl Signaller for RecordingSignaller {
        fn terminate(&mut self, pid: Pid) -> io::Result<()> {
            if self.refuse {
                return Err(io::Error::from_raw_os_error(libc::EPERM));
            }
            self.sent.push(pid);
            Ok(())
        }
    }

    fn numbered_session() -> GraphSession {
        let mut session = GraphSession::new();
        session.register_process("/usr/bin/miner", Pid(4242));
        session.register_process("/usr/bin/sshd", Pid(900));
        session.register_library("libc.so.6", "/lib/libc.so.6");
        session.number_all(EntryId(1)).unwrap();
        session
    }

    #[test]
    fn test_kill_by_id() {
        let session = numbered_session();
        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: [1] }));
        let mut signaller = RecordingSignaller::default();

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert_eq!(signaller.sent, vec![Pid(4242)]);
        assert_eq!(outcome.signalled, vec![Pid(4242)]);
        assert_eq!(outcome.unknown_ids, 0);
    }

    #[test]
    fn test_unknown_ids_are_skipped() {
        let session = numbered_session();
        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: [999, -1, 5_000_000_000_u64] }));
        let mut signaller = RecordingSignaller::default();

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert!(signaller.sent.is_empty());
        assert_eq!(outcome.unknown_ids, 3);
    }

    #[test]
    fn test_library_ids_are_never_signalled() {
        let session = numbered_session();
        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: [3] }));
        let mut signaller = RecordingSignaller::default();

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert!(signaller.sent.is_empty());
        assert_eq!(outcome.skipped_libraries, vec![EntryId(3)]);
    }

    #[test]
    fn test_failure_payload_surfaces_message() {
        let session = numbered_session();
        let response = ServerResponse(false, json!("server unavailable"));
        let mut signaller = RecordingSignaller::default();

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert!(signaller.sent.is_empty());
        assert_eq!(outcome.server_error.as_deref(), Some("server unavailable"));
    }

    #[test]
    fn test_failure_flag_ignores_directive() {
        let session = numbered_session();
        let response = ServerResponse(false, json!({ KILL_DIRECTIVE: [1] }));
        let mut signaller = RecordingSignaller::default();

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert!(signaller.sent.is_empty());
        assert!(outcome.server_error.unwrap().contains(KILL_DIRECTIVE));
    }

    #[test]
    fn test_malformed_entries_and_payloads() {
        let session = numbered_session();
        let mut signaller = RecordingSignaller::default();

        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: ["1", 2.5, 2] }));
        let outcome = execute_directive(&response, &session, &mut signaller);
        assert_eq!(outcome.malformed, 2);
        assert_eq!(signaller.sent, vec![Pid(900)]);

        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: 1 }));
        let outcome = execute_directive(&response, &session, &mut signaller);
        assert!(outcome.signalled.is_empty());

        let response = ServerResponse(true, json!("ok"));
        let outcome = execute_directive(&response, &session, &mut signaller);
        assert!(outcome.signalled.is_empty());
    }

    #[test]
    fn test_delivery_failure_is_recorded_not_retried() {
        let session = numbered_session();
        let response = ServerResponse(true, json!({ KILL_DIRECTIVE: [1, 2] }));
        let mut signaller = RecordingSignaller { refuse: true, ..Default::default() };

        let outcome = execute_directive(&response, &session, &mut signaller);

        assert_eq!(outcome.delivery_failures.len(), 2);
        assert!(outcome.signalled.is_empty());
    }

    #[test]
    fn test_decode_response() {
        assert_eq!(ServerResponse::from_value(Value::Null).unwrap(), None);
        assert_eq!(ServerResponse::from_value(json!([])).unwrap(), None);
        assert_eq!(
            ServerResponse::from_value(json!([false, "nope"])).unwrap(),
            Some(ServerResponse(false, json!("nope")))
        );
        assert!(ServerResponse::from_value(json!({"ok": true})).is_err());
        assert!(ServerResponse::from_value(json!([true])).is_err());
    }

    #[test]
    fn test_sigkill_to_missing_process_fails() {
        // PIDs are capped well below i32::MAX by the kernel
        let result = SigKill.terminate(Pid(i32::MAX));
        assert!(result.is_err());
    }
}
