//! Navigation lifecycle.
//!
//! [`Lifecycle`] decides when the overlay is built and torn down. It is a
//! pure state machine: it consumes location and attach-deadline inputs and
//! returns [`LifecycleAction`]s for the page session to carry out, so every
//! transition can be tested without a runtime.

use std::time::Duration;

use serde::Serialize;
use ytnote_core::types::VideoId;

use crate::config::OverlayConfig;

/// Where the session is in attaching to the current video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    Idle,
    /// Waiting for the host player to appear. `attempts` counts failed checks.
    Attaching { video_id: VideoId, attempts: u32 },
    Attached { video_id: VideoId },
}

/// Work the session must perform after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleAction {
    /// Tear down the overlay built for `video_id`.
    Detach { video_id: VideoId },
    /// Call [`Lifecycle::on_attach_due`] after `after`, replacing any
    /// pending deadline.
    ScheduleAttach { video_id: VideoId, after: Duration },
    /// Cancel the pending attach deadline.
    CancelAttach,
    /// Build the overlay for `video_id`.
    Attach { video_id: VideoId },
    /// The player never appeared. Nothing is attached.
    GiveUp { video_id: VideoId, attempts: u32 },
}

/// Attach timing policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachPolicy {
    pub grace: Duration,
    pub retry_interval: Duration,
    pub max_attempts: u32,
}

impl From<&OverlayConfig> for AttachPolicy {
    fn from(config: &OverlayConfig) -> Self {
        Self {
            grace: config.attach_grace,
            retry_interval: config.attach_retry_interval,
            max_attempts: config.max_attach_attempts,
        }
    }
}

impl Default for AttachPolicy {
    fn default() -> Self {
        Self::from(&OverlayConfig::default())
    }
}

/// Per-session navigation state machine.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: LifecycleState,
    policy: AttachPolicy,
    /// Video the last attach sequence gave up on. Seeing it again does not
    /// restart the sequence.
    gave_up_on: Option<VideoId>,
}

impl Lifecycle {
    pub fn new(policy: AttachPolicy) -> Self {
        Self {
            state: LifecycleState::Idle,
            policy,
            gave_up_on: None,
        }
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// The video currently attached, if any.
    pub fn attached_video(&self) -> Option<&str> {
        match &self.state {
            LifecycleState::Attached { video_id } => Some(video_id),
            _ => None,
        }
    }

    /// The video being attached or already attached.
    pub fn target_video(&self) -> Option<&str> {
        match &self.state {
            LifecycleState::Idle => None,
            LifecycleState::Attaching { video_id, .. } | LifecycleState::Attached { video_id } => {
                Some(video_id)
            }
        }
    }

    /// The page now shows `video_id` (`None` for a page without a video).
    ///
    /// Seeing the same video again is a no-op.
    pub fn on_location(&mut self, video_id: Option<VideoId>) -> Vec<LifecycleAction> {
        let Some(video_id) = video_id else {
            self.gave_up_on = None;
            return self.reset();
        };

        if self.target_video() == Some(video_id.as_str())
            || self.gave_up_on.as_deref() == Some(video_id.as_str())
        {
            return Vec::new();
        }

        let mut actions = self.reset();
        actions.retain(|a| !matches!(a, LifecycleAction::CancelAttach));
        self.gave_up_on = None;
        self.state = LifecycleState::Attaching {
            video_id: video_id.clone(),
            attempts: 0,
        };
        actions.push(LifecycleAction::ScheduleAttach {
            video_id,
            after: self.policy.grace,
        });
        actions
    }

    /// The attach deadline fired. `player_found` reports whether the host
    /// player container exists now.
    pub fn on_attach_due(&mut self, player_found: bool) -> Vec<LifecycleAction> {
        let LifecycleState::Attaching { video_id, attempts } = &self.state else {
            return Vec::new();
        };
        let video_id = video_id.clone();

        if player_found {
            self.state = LifecycleState::Attached {
                video_id: video_id.clone(),
            };
            return vec![LifecycleAction::Attach { video_id }];
        }

        let attempts = attempts + 1;
        if attempts >= self.policy.max_attempts {
            self.state = LifecycleState::Idle;
            self.gave_up_on = Some(video_id.clone());
            return vec![LifecycleAction::GiveUp { video_id, attempts }];
        }

        self.state = LifecycleState::Attaching {
            video_id: video_id.clone(),
            attempts,
        };
        vec![LifecycleAction::ScheduleAttach {
            video_id,
            after: self.policy.retry_interval,
        }]
    }

    /// Return to `Idle`, reporting what must be undone.
    fn reset(&mut self) -> Vec<LifecycleAction> {
        match std::mem::replace(&mut self.state, LifecycleState::Idle) {
            LifecycleState::Idle => Vec::new(),
            LifecycleState::Attaching { .. } => vec![LifecycleAction::CancelAttach],
            LifecycleState::Attached { video_id } => vec![LifecycleAction::Detach { video_id }],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn policy(max_attempts: u32) -> AttachPolicy {
        AttachPolicy {
            grace: Duration::from_millis(450),
            retry_interval: Duration::from_millis(800),
            max_attempts,
        }
    }

    fn attached(video_id: &str) -> Lifecycle {
        let mut lifecycle = Lifecycle::new(policy(3));
        lifecycle.on_location(Some(video_id.into()));
        lifecycle.on_attach_due(true);
        lifecycle
    }

    #[test]
    fn new_video_schedules_attach_after_grace() {
        let mut lifecycle = Lifecycle::new(policy(3));
        let actions = lifecycle.on_location(Some("a".into()));
        assert_eq!(
            actions,
            vec![LifecycleAction::ScheduleAttach {
                video_id: "a".into(),
                after: Duration::from_millis(450),
            }]
        );
        assert_matches!(lifecycle.state(), LifecycleState::Attaching { attempts: 0, .. });
    }

    #[test]
    fn attach_happens_once_per_video() {
        let mut lifecycle = Lifecycle::new(policy(3));
        lifecycle.on_location(Some("a".into()));
        assert_eq!(
            lifecycle.on_attach_due(true),
            vec![LifecycleAction::Attach { video_id: "a".into() }]
        );

        assert!(lifecycle.on_location(Some("a".into())).is_empty());
        assert!(lifecycle.on_attach_due(true).is_empty());
        assert_eq!(lifecycle.attached_video(), Some("a"));
    }

    #[test]
    fn repeated_location_while_attaching_keeps_pending_deadline() {
        let mut lifecycle = Lifecycle::new(policy(3));
        lifecycle.on_location(Some("a".into()));
        assert!(lifecycle.on_location(Some("a".into())).is_empty());
    }

    #[test]
    fn switching_videos_detaches_first() {
        let mut lifecycle = attached("a");
        let actions = lifecycle.on_location(Some("b".into()));
        assert_matches!(
            actions.as_slice(),
            [
                LifecycleAction::Detach { video_id: old },
                LifecycleAction::ScheduleAttach { video_id: new, .. },
            ] if old == "a" && new == "b"
        );
    }

    #[test]
    fn leaving_watch_page_detaches_or_cancels() {
        let mut lifecycle = attached("a");
        assert_eq!(
            lifecycle.on_location(None),
            vec![LifecycleAction::Detach { video_id: "a".into() }]
        );
        assert_eq!(lifecycle.state(), &LifecycleState::Idle);

        lifecycle.on_location(Some("b".into()));
        assert_eq!(lifecycle.on_location(None), vec![LifecycleAction::CancelAttach]);
        assert!(lifecycle.on_location(None).is_empty());
    }

    #[test]
    fn missing_player_retries_then_gives_up() {
        let mut lifecycle = Lifecycle::new(policy(3));
        lifecycle.on_location(Some("a".into()));

        for _ in 0..2 {
            assert_matches!(
                lifecycle.on_attach_due(false).as_slice(),
                [LifecycleAction::ScheduleAttach { after, .. }]
                    if *after == Duration::from_millis(800)
            );
        }
        assert_eq!(
            lifecycle.on_attach_due(false),
            vec![LifecycleAction::GiveUp { video_id: "a".into(), attempts: 3 }]
        );
        assert_eq!(lifecycle.state(), &LifecycleState::Idle);

        // Same location does not restart; a different one does.
        assert!(lifecycle.on_location(Some("a".into())).is_empty());
        assert_eq!(lifecycle.on_location(Some("b".into())).len(), 1);
    }

    #[test]
    fn navigation_resets_attempt_counter() {
        let mut lifecycle = Lifecycle::new(policy(3));
        lifecycle.on_location(Some("a".into()));
        lifecycle.on_attach_due(false);
        lifecycle.on_attach_due(false);

        lifecycle.on_location(Some("b".into()));
        assert_matches!(lifecycle.state(), LifecycleState::Attaching { attempts: 0, .. });
    }
}
