//! Server hook catalogue and hook kinds.
//!
//! Hook names follow `{kind}:{root}.{location}.{subLocation?}.{actionType}.{target}`.
//! The kind prefix decides how the dispatcher runs the handlers:
//!
//! - `filter:` handlers transform a value, each one receiving the output of the previous.
//! - `action:` handlers run for side effects and are not awaited.
//! - anything else is a static hook: awaited in order, no value transform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a hook's handlers are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    /// Value pipeline.
    Filter,
    /// Fire-and-forget side effects.
    Action,
    /// Awaited side effects.
    Static,
}

impl HookType {
    /// Returns the string name of this hook kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filter => "filter",
            Self::Action => "action",
            Self::Static => "static",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classifies a hook name by its prefix.
pub fn hook_type(hook_name: &str) -> HookType {
    if hook_name.starts_with("filter:") {
        HookType::Filter
    } else if hook_name.starts_with("action:") {
        HookType::Action
    } else {
        HookType::Static
    }
}

/// Returns whether `hook_name` is a hook the server exposes to extensions.
pub fn is_server_hook(hook_name: &str) -> bool {
    SERVER_FILTER_HOOKS.contains(&hook_name) || SERVER_ACTION_HOOKS.contains(&hook_name)
}

/// Filter hooks exposed by the server.
pub const SERVER_FILTER_HOOKS: &[&str] = &[
    // ── Video listings ──
    "filter:api.videos.list.params",
    "filter:api.videos.list.result",
    "filter:api.video-playlist.videos.list.params",
    "filter:api.video-playlist.videos.list.result",
    "filter:api.accounts.videos.list.params",
    "filter:api.accounts.videos.list.result",
    "filter:api.video-channels.videos.list.params",
    "filter:api.video-channels.videos.list.result",
    "filter:api.user.me.videos.list.params",
    "filter:api.user.me.videos.list.result",
    "filter:api.overviews.videos.list.params",
    "filter:api.overviews.videos.list.result",
    "filter:api.user.me.subscription-videos.list.params",
    "filter:api.user.me.subscription-videos.list.result",
    // ── Search ──
    "filter:api.search.videos.local.list.params",
    "filter:api.search.videos.local.list.result",
    "filter:api.search.videos.index.list.params",
    "filter:api.search.videos.index.list.result",
    "filter:api.search.video-channels.local.list.params",
    "filter:api.search.video-channels.local.list.result",
    "filter:api.search.video-channels.index.list.params",
    "filter:api.search.video-channels.index.list.result",
    "filter:api.search.video-playlists.local.list.params",
    "filter:api.search.video-playlists.local.list.result",
    "filter:api.search.video-playlists.index.list.params",
    "filter:api.search.video-playlists.index.list.result",
    // ── Single resources ──
    "filter:api.video.get.result",
    "filter:api.video-channels.list.params",
    "filter:api.video-channels.list.result",
    "filter:api.video-channel.get.result",
    // ── Accept checks ──
    "filter:api.video.upload.accept.result",
    "filter:api.live-video.create.accept.result",
    "filter:api.video.pre-import-url.accept.result",
    "filter:api.video.pre-import-torrent.accept.result",
    "filter:api.video.post-import-url.accept.result",
    "filter:api.video.post-import-torrent.accept.result",
    "filter:api.video.update-file.accept.result",
    "filter:api.video.user-import.accept.result",
    "filter:api.video-thread.create.accept.result",
    "filter:api.video-comment-reply.create.accept.result",
    // ── Video attributes ──
    "filter:api.video.upload.video-attribute.result",
    "filter:api.video.import-url.video-attribute.result",
    "filter:api.video.import-torrent.video-attribute.result",
    "filter:api.video.live.video-attribute.result",
    "filter:api.video.user-import.video-attribute.result",
    // ── Comments ──
    "filter:api.video-threads.list.params",
    "filter:api.video-threads.list.result",
    "filter:api.video-thread-comments.list.params",
    "filter:api.video-thread-comments.list.result",
    // ── Server / users ──
    "filter:api.server.stats.get.result",
    "filter:video.auto-blacklist.result",
    "filter:api.user.signup.allowed.result",
    "filter:api.user.request-signup.allowed.result",
    "filter:api.user.me.get.result",
    "filter:oauth.password-grant.get-user.params",
    "filter:api.email-verification.ask-send-verify-email.body",
    "filter:api.users.ask-reset-password.body",
    // ── Downloads / embeds ──
    "filter:api.download.video.allowed.result",
    "filter:api.download.generated-video.allowed.result",
    "filter:api.download.torrent.allowed.result",
    "filter:html.embed.video.allowed.result",
    "filter:html.embed.video-playlist.allowed.result",
    "filter:html.client.json-ld.result",
    // ── Jobs / transcoding ──
    "filter:job-queue.process.params",
    "filter:job-queue.process.result",
    "filter:transcoding.manual.resolutions-to-transcode.result",
    "filter:transcoding.auto.resolutions-to-transcode.result",
    // ── Federation / feeds ──
    "filter:activity-pub.remote-video-comment.create.accept.result",
    "filter:activity-pub.activity.context.build.result",
    "filter:activity-pub.video.json-ld.build.result",
    "filter:feed.podcast.rss.create-custom-xmlns.result",
    "filter:feed.podcast.channel.create-custom-tags.result",
    "filter:feed.podcast.video.create-custom-tags.result",
];

/// Action hooks exposed by the server.
pub const SERVER_ACTION_HOOKS: &[&str] = &[
    "action:application.listening",
    "action:notifier.notification.created",
    // ── Videos ──
    "action:api.video.updated",
    "action:api.video.deleted",
    "action:api.video.uploaded",
    "action:api.video.viewed",
    "action:api.video.file-updated",
    // ── Channels ──
    "action:api.video-channel.created",
    "action:api.video-channel.updated",
    "action:api.video-channel.deleted",
    // ── Live ──
    "action:api.live-video.created",
    "action:live.video.state.updated",
    // ── Comments / captions ──
    "action:api.video-thread.created",
    "action:api.video-comment-reply.created",
    "action:api.video-comment.deleted",
    "action:api.video-caption.created",
    "action:api.video-caption.deleted",
    // ── Users ──
    "action:api.user.blocked",
    "action:api.user.unblocked",
    "action:api.user.registered",
    "action:api.user.requested-registration",
    "action:api.user.created",
    "action:api.user.deleted",
    "action:api.user.updated",
    "action:api.user.oauth2-got-token",
    // ── Playlists / federation ──
    "action:api.video-playlist-element.created",
    "action:activity-pub.remote-video.created",
    "action:activity-pub.remote-video.updated",
];
