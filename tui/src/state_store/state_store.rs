use std::{future::Future, sync::Arc};

use anyhow::Context;
use comms::{ChatClient, ClientError, ClientEvent, Membership, Room};
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc::{self, UnboundedReceiver, UnboundedSender},
};

use crate::{
    render,
    termination::{Interrupted, Terminator},
};

use super::{
    action::{Action, Completion},
    command::Command,
    output::{Console, Output},
    State,
};

/// Events requested per room by the first sync
const INITIAL_TIMELINE_LIMIT: u32 = 20;

/// [StateStore] owns the session state and is the only place it is changed.
///
/// Lines from the prompt, notifications from the client and the outcome of spawned requests are
/// all handled one at a time on the [StateStore::main_loop] task.
pub struct StateStore {
    client: Arc<dyn ChatClient>,
    state: State,
    console: Console,
    completion_tx: UnboundedSender<Completion>,
    completion_rx: UnboundedReceiver<Completion>,
}

impl StateStore {
    pub fn new(client: Arc<dyn ChatClient>) -> (Self, UnboundedReceiver<Output>) {
        let (console, output_rx) = Console::new();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        (
            StateStore {
                client,
                state: State::default(),
                console,
                completion_tx,
                completion_rx,
            },
            output_rx,
        )
    }
}

impl StateStore {
    pub async fn main_loop(
        mut self,
        mut terminator: Terminator,
        mut action_rx: UnboundedReceiver<Action>,
        mut interrupt_rx: broadcast::Receiver<Interrupted>,
    ) -> anyhow::Result<Interrupted> {
        // subscribe before starting so the initial sync can not be missed
        let mut client_events = self.client.subscribe();
        self.client
            .start(INITIAL_TIMELINE_LIMIT)
            .await
            .context("could not start the chat client")?;

        let result = loop {
            tokio::select! {
                // Handle the lines typed at the prompt
                Some(action) = action_rx.recv() => match action {
                    Action::SubmitLine { line } => {
                        self.handle_line(&line).await?;
                    },
                    Action::Exit => {
                        let _ = terminator.terminate(Interrupted::UserInt);

                        break Interrupted::UserInt;
                    },
                },
                // Handle the notifications of the client, these drive the re-renders
                maybe_event = client_events.recv() => match maybe_event {
                    Ok(event) => self.handle_client_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed client events");
                    },
                    Err(RecvError::Closed) => {
                        anyhow::bail!("the chat client stopped publishing events");
                    },
                },
                // Handle the requests which settled in the background
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion).await;
                },
                // Catch and handle interrupt signal to gracefully shutdown
                Ok(interrupted) = interrupt_rx.recv() => {
                    break interrupted;
                }
            }
        };

        Ok(result)
    }

    /// Interprets a line typed at the prompt.
    ///
    /// Fails only when `/join` is given an index that is not in the room list.
    pub(super) async fn handle_line(&mut self, line: &str) -> anyhow::Result<()> {
        if line.trim().is_empty() {
            self.console.prompt();
            return Ok(());
        }

        let command = Command::parse(line, self.state.is_viewing_room());
        tracing::debug!(?command, "handling command");

        match command {
            Command::Join(index) => self.join(&index).await?,
            Command::Exit => {
                self.state.viewing_room = None;
                self.print_room_list();
            }
            Command::Members => self.print_member_list().await,
            Command::Resend => self.resend().await,
            Command::More(limit) => self.scrollback(limit),
            Command::Help => self.console.print(render::help()),
            Command::Send(text) => self.send(text).await,
            Command::Ignored => {}
        }

        self.console.prompt();

        Ok(())
    }

    pub(super) async fn handle_client_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::SyncComplete => {
                self.state.room_list = self.client.rooms().await;
                self.print_room_list();
                self.console.print(render::help());
                self.console.prompt();
            }
            ClientEvent::RoomUpdated { room_id } => {
                tracing::debug!(%room_id, "room updated");
                self.state.room_list = self.client.rooms().await;
                if !self.state.is_viewing_room() {
                    self.print_room_list();
                    self.console.prompt();
                }
            }
            ClientEvent::SyncFailed { error } => {
                tracing::error!(%error, "synchronisation stopped");
                self.console.print_line(format!("Sync Error: {error}"));
                self.console.prompt();
            }
            ClientEvent::Timeline {
                room_id,
                event,
                to_start_of_timeline,
            } => {
                // paginated results are drawn by the redraw after `/more`
                if to_start_of_timeline || !self.state.is_viewing(&room_id) {
                    return;
                }

                self.console
                    .print_line(render::line(&event, self.client.user_id()));
            }
        }
    }

    pub(super) async fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Joined(Ok(room)) => {
                self.state.room_list = self.client.rooms().await;
                self.state.viewing_room = Some(room.room_id);
                self.print_messages().await;
                self.console.prompt();
            }
            Completion::Joined(Err(err)) => self.report_failure("/join", &err),
            Completion::Resent(Ok(())) | Completion::Backfilled(Ok(())) => {
                self.print_messages().await;
                self.console.prompt();
            }
            Completion::Resent(Err(err)) => self.report_failure("/resend", &err),
            Completion::Backfilled(Err(err)) => self.report_failure("/more", &err),
            Completion::Sent(result) => {
                // the settled redraw, following the optimistic one made when sending
                self.print_messages().await;
                if let Err(err) = result {
                    self.report_failure("Send", &err);
                }
                self.console.prompt();
            }
        }
    }

    async fn join(&mut self, index: &str) -> anyhow::Result<()> {
        let room = self
            .state
            .room_at(index)
            .cloned()
            .with_context(|| format!("no room at index {index:?} of the room list"))?;

        self.state.viewing_room = Some(room.room_id.clone());

        let invited = room
            .get_member(self.client.user_id())
            .and_then(|member| member.membership.as_ref())
            == Some(&Membership::Invite);

        if invited {
            let client = self.client.clone();
            self.spawn_request(async move { Completion::Joined(client.join_room(&room.room_id).await) });
        } else {
            self.print_messages().await;
        }

        Ok(())
    }

    async fn resend(&self) {
        let Some(room) = self.viewed_room().await else {
            return;
        };
        let Some(event) = room.first_not_sent().cloned() else {
            return;
        };

        let client = self.client.clone();
        self.spawn_request(async move {
            Completion::Resent(client.resend_event(&room.room_id, &event).await)
        });
    }

    fn scrollback(&self, limit: u32) {
        let Some(room_id) = self.state.viewing_room.clone() else {
            return;
        };

        let client = self.client.clone();
        self.spawn_request(async move { Completion::Backfilled(client.scrollback(&room_id, limit).await) });
    }

    async fn send(&self, text: String) {
        let Some(room_id) = self.state.viewing_room.clone() else {
            return;
        };

        match self.client.enqueue_text(&room_id, &text).await {
            Ok(transaction_id) => {
                let client = self.client.clone();
                self.spawn_request(async move {
                    Completion::Sent(client.send_event(&room_id, &transaction_id).await)
                });

                // optimistic redraw, showing the local echo before the server answers
                self.print_messages().await;
            }
            Err(err) => self.report_failure("Send", &err),
        }
    }

    /// Runs a request in the background, its [Completion] is handled by the main loop
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let _ = completion_tx.send(request.await);
        });
    }

    fn report_failure(&self, command: &str, err: &ClientError) {
        tracing::warn!(command, error = %err, "request failed");
        self.console.print_line(format!("{command} Error: {err}"));
    }

    async fn viewed_room(&self) -> Option<Room> {
        let room_id = self.state.viewing_room.as_deref()?;

        self.client.room(room_id).await
    }

    fn print_room_list(&self) {
        self.console.print(render::room_list(&self.state.room_list));
    }

    async fn print_messages(&self) {
        match self.viewed_room().await {
            Some(room) => {
                self.console.clear();
                self.console
                    .print(render::messages(&room, self.client.user_id()));
            }
            None => self.print_room_list(),
        }
    }

    async fn print_member_list(&self) {
        match self.viewed_room().await {
            Some(room) => self
                .console
                .print(render::member_list(&room, self.client.user_id())),
            None => self.print_room_list(),
        }
    }
}
