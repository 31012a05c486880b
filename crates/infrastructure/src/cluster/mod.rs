pub mod role_override;
pub mod transport;

pub use role_override::FileRoleOverrideReader;
pub use transport::ReqwestClusterTransport;
