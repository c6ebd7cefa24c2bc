use comms::{ClientError, Room};

/// Requests coming from the prompt
#[derive(Debug, Clone)]
pub enum Action {
    SubmitLine { line: String },
    Exit,
}

/// Outcome of a request the state store spawned, delivered back to its loop
#[derive(Debug)]
pub enum Completion {
    Joined(Result<Room, ClientError>),
    Resent(Result<(), ClientError>),
    Backfilled(Result<(), ClientError>),
    Sent(Result<(), ClientError>),
}
