mod channel;
mod ipc;

pub use channel::{ChannelSource, ReplaySource};
pub use ipc::{HandPoseMessage, IpcHandPose};
