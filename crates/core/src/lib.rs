pub mod command;
mod error;
pub mod executors;
pub mod feedback;
mod notifier;
mod precision;
mod session;
pub mod targets;
pub mod tools;
mod tuning;
pub mod widgets;

pub use command::{
    AppInfo, Command, CommandList, CommandManager, CommandRegistry, Op, SessionState,
};
pub use error::{Result, SessionError};
pub use executors::{register_executors, ExecContext};
pub use feedback::{Feedback, FeedbackId, FeedbackManager};
pub use notifier::Notifier;
pub use precision::PrecisionStore;
pub use session::{read_session, read_session_str, write_session, SESSION_VERSION};
pub use targets::{EdgeTarget, PointTarget, TargetManager};
pub use tools::{Tool, ToolBase, ToolContext};
pub use tuning::{Color, FeedbackColors, Tuning};
pub use widgets::{DragInfo, DraggableWidget, Hit, Trigger};
