pub mod assignment;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod identity;
pub mod notices;
pub mod profile;
pub mod shell;
pub mod subscription;

use tracing_subscriber::{fmt, EnvFilter};

pub use assignment::AssignmentStore;
pub use config::ClientConfig;
pub use context::ClientContext;
pub use controller::{AssignmentController, DragPayload, InteractionMode, Selection, TapOutcome};
pub use error::ClientError;
pub use identity::{AuthProvider, AuthUser, IdentityProvider, Session};
pub use notices::{LogNotices, Notice, NoticeKind, NoticeSink};
pub use profile::{ProfileLoad, ProfileService};
pub use subscription::Subscription;

/// Install the global fmt subscriber.  `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("wishlane=info,wishlane_client=debug,wishlane_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
