//! Event routing for one connection's session.

use crate::broadcast::BroadcastDispatcher;
use crate::directory::PlayerDirectory;
use crate::entitlements::sanitize_avatar;
use crate::rooms::RoomRegistry;
use crate::session::Session;
use std::sync::Arc;
use studyhall_protocol::{
    current_timestamp_ms, AvatarConfig, ClientEvent, Facing, PlayerPresence, PresenceUpdate,
    RoomId, ServerEvent, UserId, LIBRARY_SPAWN, LOBBY_RETURN_SPAWN, LOBBY_SPAWN, MAX_CHAT_LEN,
};
use tracing::{debug, info, trace, warn};

/// Routes a session's client events to the registry and the dispatcher.
///
/// One router instance is shared by every connection; all per-connection
/// state lives in the [`Session`] the caller passes in. Events that arrive
/// while the session is not in a permitted room are dropped silently, which
/// covers both misbehaving clients and frames that were already in flight
/// when the player moved.
pub struct SessionRouter {
    registry: Arc<RoomRegistry>,
    dispatcher: BroadcastDispatcher,
    directory: Arc<dyn PlayerDirectory>,
}

impl SessionRouter {
    /// Creates a router over the shared registry and dispatcher.
    pub fn new(
        registry: Arc<RoomRegistry>,
        dispatcher: BroadcastDispatcher,
        directory: Arc<dyn PlayerDirectory>,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            directory,
        }
    }

    /// Parses a raw text frame and routes it.
    ///
    /// Malformed frames are logged and dropped; they never tear the
    /// connection down.
    pub async fn handle_raw(&self, session: &mut Session, raw: &str) {
        match serde_json::from_str::<ClientEvent>(raw) {
            Ok(event) => self.handle_event(session, event).await,
            Err(e) => {
                trace!(
                    "❌ Dropping malformed frame from connection {}: {}",
                    session.connection_id,
                    e
                );
            }
        }
    }

    /// Routes one already-parsed client event.
    pub async fn handle_event(&self, session: &mut Session, event: ClientEvent) {
        match event {
            ClientEvent::JoinLobby => self.handle_join_lobby(session).await,
            ClientEvent::PlayerMove { x, y, facing } => {
                self.handle_move(session, x, y, facing).await
            }
            ClientEvent::PlayerState { state } => self.handle_state(session, state).await,
            ClientEvent::EnterLibrary => self.handle_enter_library(session).await,
            ClientEvent::ExitLibrary => self.handle_exit_library(session).await,
            ClientEvent::ChatMessage { message } => self.handle_chat(session, message).await,
            ClientEvent::PrivateMessage { to, message } => {
                self.handle_private_message(session, to, message).await
            }
            ClientEvent::StudyTopic { topic } => self.handle_study_topic(session, topic).await,
            ClientEvent::StartQuiz => {
                info!(
                    "📝 Player {} ({}) started a quiz",
                    session.identity.username, session.connection_id
                );
            }
            ClientEvent::QuizAnswer {
                question_index,
                is_correct,
                score,
            } => {
                self.handle_quiz_answer(session, question_index, is_correct, score)
                    .await
            }
            ClientEvent::AvatarChanged { avatar_config } => {
                self.handle_avatar_changed(session, avatar_config).await
            }
            ClientEvent::AchievementEarned {
                achievement_id,
                achievement_name,
            } => {
                self.handle_achievement(session, achievement_id, achievement_name)
                    .await
            }
        }
    }

    /// Removes the session from its room on disconnect.
    ///
    /// Idempotent: a session that never joined a room, or was already
    /// cleaned up, produces no broadcast. The departure event on this path
    /// carries the full identity so clients can label who left.
    pub async fn handle_disconnect(&self, session: &mut Session) {
        let room = match session.current_room.take() {
            Some(room) => room,
            None => return,
        };

        if let Some(presence) = self.registry.remove_player(room, session.connection_id).await {
            self.dispatcher
                .to_room(
                    room,
                    &ServerEvent::PlayerLeft {
                        socket_id: session.connection_id,
                        user_id: Some(presence.user_id.clone()),
                        username: Some(presence.username.clone()),
                    },
                )
                .await;
            info!(
                "👋 Player {} ({}) left {} on disconnect",
                presence.username, session.connection_id, room
            );
        }
    }

    async fn handle_join_lobby(&self, session: &mut Session) {
        let avatar = self.validated_avatar(session).await;
        self.enter_room(session, RoomId::Lobby, LOBBY_SPAWN, avatar)
            .await;
        info!(
            "👥 Player {} ({}) joined the lobby",
            session.identity.username, session.connection_id
        );
    }

    async fn handle_move(&self, session: &mut Session, x: f64, y: f64, facing: Option<Facing>) {
        let room = match session.current_room {
            Some(room) => room,
            None => {
                trace!(
                    "📪 Dropping movement from roomless connection {}",
                    session.connection_id
                );
                return;
            }
        };

        if !self
            .registry
            .update_player(room, session.connection_id, PresenceUpdate::movement(x, y, facing))
            .await
        {
            return;
        }

        self.dispatcher
            .to_room_except(
                room,
                session.connection_id,
                &ServerEvent::PlayerMoved {
                    socket_id: session.connection_id,
                    user_id: session.identity.user_id.clone(),
                    username: session.identity.username.clone(),
                    x,
                    y,
                    facing,
                },
            )
            .await;
    }

    async fn handle_state(&self, session: &mut Session, state: String) {
        let room = match session.current_room {
            Some(room) => room,
            None => {
                trace!(
                    "📪 Dropping state change from roomless connection {}",
                    session.connection_id
                );
                return;
            }
        };

        if !self
            .registry
            .update_player(
                room,
                session.connection_id,
                PresenceUpdate::state_label(state.clone()),
            )
            .await
        {
            return;
        }

        self.dispatcher
            .to_room_except(
                room,
                session.connection_id,
                &ServerEvent::PlayerStateChanged {
                    socket_id: session.connection_id,
                    user_id: session.identity.user_id.clone(),
                    state,
                },
            )
            .await;
    }

    async fn handle_enter_library(&self, session: &mut Session) {
        if session.current_room != Some(RoomId::Lobby) {
            trace!(
                "📪 Ignoring enter-library from connection {} outside the lobby",
                session.connection_id
            );
            return;
        }

        let avatar = self.validated_avatar(session).await;
        self.enter_room(session, RoomId::Library, LIBRARY_SPAWN, avatar)
            .await;
        info!(
            "📚 Player {} ({}) entered the library",
            session.identity.username, session.connection_id
        );
    }

    async fn handle_exit_library(&self, session: &mut Session) {
        if session.current_room != Some(RoomId::Library) {
            trace!(
                "📪 Ignoring exit-library from connection {} outside the library",
                session.connection_id
            );
            return;
        }

        // Returning to the lobby reuses the avatar validated on the way in.
        let avatar = session.avatar.clone();
        self.enter_room(session, RoomId::Lobby, LOBBY_RETURN_SPAWN, avatar)
            .await;
        info!(
            "🚪 Player {} ({}) returned to the lobby",
            session.identity.username, session.connection_id
        );
    }

    async fn handle_chat(&self, session: &mut Session, message: String) {
        let room = match session.current_room {
            Some(room) => room,
            None => {
                trace!(
                    "📪 Dropping chat from roomless connection {}",
                    session.connection_id
                );
                return;
            }
        };

        let trimmed = message.trim();
        if trimmed.is_empty() {
            return;
        }
        let message: String = trimmed.chars().take(MAX_CHAT_LEN).collect();

        debug!(
            "💬 Chat in {} from {}: {} char(s)",
            room,
            session.identity.username,
            message.chars().count()
        );
        self.dispatcher
            .to_room(
                room,
                &ServerEvent::ChatMessage {
                    user_id: session.identity.user_id.clone(),
                    username: session.identity.username.clone(),
                    message,
                    timestamp: current_timestamp_ms(),
                },
            )
            .await;
    }

    async fn handle_private_message(&self, session: &mut Session, to: UserId, message: String) {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return;
        }
        let message: String = trimmed.chars().take(MAX_CHAT_LEN).collect();

        let delivered = self
            .dispatcher
            .to_user(
                &to,
                &ServerEvent::PrivateMessage {
                    from: session.identity.user_id.clone(),
                    from_username: session.identity.username.clone(),
                    message,
                    timestamp: current_timestamp_ms(),
                },
            )
            .await;

        if delivered == 0 {
            debug!(
                "📭 Private message from {} to offline user {}",
                session.identity.username, to
            );
        }
    }

    async fn handle_study_topic(&self, session: &mut Session, topic: String) {
        if session.current_room != Some(RoomId::Library) {
            trace!(
                "📪 Ignoring study topic from connection {} outside the library",
                session.connection_id
            );
            return;
        }

        if !self
            .registry
            .update_player(
                RoomId::Library,
                session.connection_id,
                PresenceUpdate::topic(topic.clone()),
            )
            .await
        {
            return;
        }

        info!(
            "📖 Player {} ({}) is studying {}",
            session.identity.username, session.connection_id, topic
        );
        self.dispatcher
            .to_room_except(
                RoomId::Library,
                session.connection_id,
                &ServerEvent::PlayerStudying {
                    socket_id: session.connection_id,
                    username: session.identity.username.clone(),
                    topic,
                },
            )
            .await;
    }

    async fn handle_quiz_answer(
        &self,
        session: &mut Session,
        question_index: u32,
        is_correct: bool,
        score: u32,
    ) {
        debug!(
            "❓ Player {} answered question {} ({}): score {}",
            session.identity.username,
            question_index,
            if is_correct { "correct" } else { "wrong" },
            score
        );
        self.dispatcher
            .to_all(&ServerEvent::PlayerQuizProgress {
                user_id: session.identity.user_id.clone(),
                username: session.identity.username.clone(),
                score,
                timestamp: current_timestamp_ms(),
            })
            .await;
    }

    async fn handle_avatar_changed(&self, session: &mut Session, requested: AvatarConfig) {
        let profile = match self.directory.profile(&session.identity.user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(
                    "⚠️ Avatar change for {} dropped, profile lookup failed: {}",
                    session.identity.user_id, e
                );
                return;
            }
        };

        let (avatar, _coerced) = sanitize_avatar(&profile, requested);

        if let Err(e) = self
            .directory
            .save_avatar(&session.identity.user_id, &avatar)
            .await
        {
            warn!(
                "⚠️ Failed to persist avatar for {}: {}",
                session.identity.user_id, e
            );
            return;
        }

        session.avatar = avatar.clone();
        info!(
            "🎨 Player {} ({}) changed avatar to {}/{}",
            session.identity.username, session.connection_id, avatar.body, avatar.head
        );

        if let Some(room) = session.current_room {
            if self
                .registry
                .update_player(
                    room,
                    session.connection_id,
                    PresenceUpdate::avatar(avatar.clone()),
                )
                .await
            {
                self.dispatcher
                    .to_room_except(
                        room,
                        session.connection_id,
                        &ServerEvent::PlayerAvatarChanged {
                            socket_id: session.connection_id,
                            user_id: session.identity.user_id.clone(),
                            avatar_config: avatar,
                        },
                    )
                    .await;
            }
        }
    }

    async fn handle_achievement(
        &self,
        session: &mut Session,
        achievement_id: String,
        achievement_name: String,
    ) {
        info!(
            "🏆 Player {} earned achievement: {}",
            session.identity.username, achievement_name
        );
        self.dispatcher
            .to_all(&ServerEvent::PlayerAchievement {
                user_id: session.identity.user_id.clone(),
                username: session.identity.username.clone(),
                achievement_id,
                achievement_name,
                timestamp: current_timestamp_ms(),
            })
            .await;
    }

    /// Fetches and sanitizes the player's persisted avatar for a room entry.
    ///
    /// A corrected selection is written back so the stored profile converges
    /// on something the player is entitled to. If the directory itself is
    /// unreachable the player still gets in, wearing defaults.
    async fn validated_avatar(&self, session: &mut Session) -> AvatarConfig {
        let avatar = match self.directory.profile(&session.identity.user_id).await {
            Ok(profile) => {
                let (avatar, coerced) = sanitize_avatar(&profile, profile.avatar.clone());
                if coerced {
                    if let Err(e) = self
                        .directory
                        .save_avatar(&session.identity.user_id, &avatar)
                        .await
                    {
                        warn!(
                            "⚠️ Failed to persist corrected avatar for {}: {}",
                            session.identity.user_id, e
                        );
                    }
                }
                avatar
            }
            Err(e) => {
                warn!(
                    "⚠️ Avatar lookup failed for {}, using defaults: {}",
                    session.identity.user_id, e
                );
                AvatarConfig::default()
            }
        };
        session.avatar = avatar.clone();
        avatar
    }

    /// Places the session in `room` at `spawn` and runs the join broadcasts.
    ///
    /// Coming from another room this is a single atomic transition: the old
    /// room's peers get a departure event carrying only the socket id. The
    /// joining connection receives the room snapshot; existing occupants get
    /// the new player's record.
    async fn enter_room(
        &self,
        session: &mut Session,
        room: RoomId,
        spawn: (f64, f64),
        avatar: AvatarConfig,
    ) {
        let presence = PlayerPresence::spawn(session.connection_id, &session.identity, avatar, spawn);

        let stored = match session.current_room {
            Some(previous) if previous != room => {
                let stored = self
                    .registry
                    .transition(previous, room, session.connection_id, presence)
                    .await;
                self.dispatcher
                    .to_room(
                        previous,
                        &ServerEvent::PlayerLeft {
                            socket_id: session.connection_id,
                            user_id: None,
                            username: None,
                        },
                    )
                    .await;
                stored
            }
            _ => self.registry.add_player(room, presence).await,
        };
        session.current_room = Some(room);

        let players = self.registry.players(room).await;
        let snapshot = match room {
            RoomId::Lobby => ServerEvent::LobbyState { players },
            RoomId::Library => ServerEvent::LibraryState { players },
        };
        self.dispatcher
            .to_connection(session.connection_id, &snapshot);
        self.dispatcher
            .to_room_except(room, session.connection_id, &ServerEvent::PlayerJoined(stored))
            .await;
    }
}
