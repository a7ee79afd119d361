//! Constants for the iControl session API

/// Root aggregate folder. Listing from here with recursion on sees every partition.
pub const ROOT_FOLDER: &str = "/";

/// Folder mutations fall back to when the session sits at [`ROOT_FOLDER`].
pub const DEFAULT_WRITABLE_FOLDER: &str = "/Common";

/// Substring of `get_version` output this client supports.
pub const SUPPORTED_VERSION_MARKER: &str = "BIG-IP_v11";

/// Enabled/disabled values of `Common::EnabledState`.
pub const STATE_ENABLED: &str = "STATE_ENABLED";
pub const STATE_DISABLED: &str = "STATE_DISABLED";

/// Prefix stripped from `System.Failover.get_failover_state` results.
pub const FAILOVER_STATE_PREFIX: &str = "FAILOVER_STATE_";

/// Remote procedures used by the session layer.
pub mod procedures {
    pub const GET_ACTIVE_FOLDER: &str = "System.Session.get_active_folder";
    pub const SET_ACTIVE_FOLDER: &str = "System.Session.set_active_folder";
    pub const GET_RECURSIVE_QUERY_STATE: &str = "System.Session.get_recursive_query_state";
    pub const SET_RECURSIVE_QUERY_STATE: &str = "System.Session.set_recursive_query_state";
    pub const START_TRANSACTION: &str = "System.Session.start_transaction";
    pub const SUBMIT_TRANSACTION: &str = "System.Session.submit_transaction";
    pub const ROLLBACK_TRANSACTION: &str = "System.Session.rollback_transaction";
    pub const GET_TRANSACTION_TIMEOUT: &str = "System.Session.get_transaction_timeout";
    pub const SET_TRANSACTION_TIMEOUT: &str = "System.Session.set_transaction_timeout";
    pub const GET_VERSION: &str = "System.SystemInfo.get_version";
    pub const GET_SYSTEM_INFORMATION: &str = "System.SystemInfo.get_system_information";
    pub const GET_FAILOVER_STATE: &str = "System.Failover.get_failover_state";
}
