//! Remote procedures used by the resource proxies

/// Prefix of `LocalLB::LBMethod` values, dropped in the munged form.
pub const LB_METHOD_PREFIX: &str = "LB_METHOD_";

/// Prefix of `LocalLB::AvailabilityStatus` values, dropped in the munged form.
pub const AVAILABILITY_STATUS_PREFIX: &str = "AVAILABILITY_STATUS_";

/// Prefix of `LocalLB::ProtocolType` values.
pub const PROTOCOL_PREFIX: &str = "PROTOCOL_";

/// Prefix of `LocalLB::VirtualServer::VirtualServerType` values.
pub const VS_TYPE_PREFIX: &str = "RESOURCE_TYPE_";

pub mod pool {
    pub const GET_LIST: &str = "LocalLB.Pool.get_list";
    pub const CREATE: &str = "LocalLB.Pool.create_v2";
    pub const DELETE: &str = "LocalLB.Pool.delete_pool";
    pub const GET_DESCRIPTION: &str = "LocalLB.Pool.get_description";
    pub const SET_DESCRIPTION: &str = "LocalLB.Pool.set_description";
    pub const GET_LB_METHOD: &str = "LocalLB.Pool.get_lb_method";
    pub const SET_LB_METHOD: &str = "LocalLB.Pool.set_lb_method";
    pub const GET_MINIMUM_ACTIVE_MEMBER: &str = "LocalLB.Pool.get_minimum_active_member";
    pub const SET_MINIMUM_ACTIVE_MEMBER: &str = "LocalLB.Pool.set_minimum_active_member";
    pub const GET_MINIMUM_UP_MEMBER: &str = "LocalLB.Pool.get_minimum_up_member";
    pub const SET_MINIMUM_UP_MEMBER: &str = "LocalLB.Pool.set_minimum_up_member";
    pub const GET_SLOW_RAMP_TIME: &str = "LocalLB.Pool.get_slow_ramp_time";
    pub const SET_SLOW_RAMP_TIME: &str = "LocalLB.Pool.set_slow_ramp_time";
    pub const GET_ACTIVE_MEMBER_COUNT: &str = "LocalLB.Pool.get_active_member_count";
    pub const RESET_STATISTICS: &str = "LocalLB.Pool.reset_statistics";

    pub const GET_MEMBER: &str = "LocalLB.Pool.get_member_v2";
    pub const ADD_MEMBER: &str = "LocalLB.Pool.add_member_v2";
    pub const REMOVE_MEMBER: &str = "LocalLB.Pool.remove_member_v2";

    pub const GET_MEMBER_DESCRIPTION: &str = "LocalLB.Pool.get_member_description";
    pub const SET_MEMBER_DESCRIPTION: &str = "LocalLB.Pool.set_member_description";
    pub const GET_MEMBER_CONNECTION_LIMIT: &str = "LocalLB.Pool.get_member_connection_limit";
    pub const SET_MEMBER_CONNECTION_LIMIT: &str = "LocalLB.Pool.set_member_connection_limit";
    pub const GET_MEMBER_DYNAMIC_RATIO: &str = "LocalLB.Pool.get_member_dynamic_ratio";
    pub const SET_MEMBER_DYNAMIC_RATIO: &str = "LocalLB.Pool.set_member_dynamic_ratio";
    pub const GET_MEMBER_PRIORITY: &str = "LocalLB.Pool.get_member_priority";
    pub const SET_MEMBER_PRIORITY: &str = "LocalLB.Pool.set_member_priority";
    pub const GET_MEMBER_RATE_LIMIT: &str = "LocalLB.Pool.get_member_rate_limit";
    pub const SET_MEMBER_RATE_LIMIT: &str = "LocalLB.Pool.set_member_rate_limit";
    pub const GET_MEMBER_RATIO: &str = "LocalLB.Pool.get_member_ratio";
    pub const SET_MEMBER_RATIO: &str = "LocalLB.Pool.set_member_ratio";
    pub const GET_MEMBER_SESSION_ENABLED_STATE: &str =
        "LocalLB.Pool.get_member_session_enabled_state";
    pub const SET_MEMBER_SESSION_ENABLED_STATE: &str =
        "LocalLB.Pool.set_member_session_enabled_state";
    pub const GET_MEMBER_OBJECT_STATUS: &str = "LocalLB.Pool.get_member_object_status";
}

pub mod node {
    pub const GET_LIST: &str = "LocalLB.NodeAddressV2.get_list";
    pub const CREATE: &str = "LocalLB.NodeAddressV2.create";
    pub const DELETE: &str = "LocalLB.NodeAddressV2.delete_node_address";
    pub const GET_ADDRESS: &str = "LocalLB.NodeAddressV2.get_address";
    pub const GET_CONNECTION_LIMIT: &str = "LocalLB.NodeAddressV2.get_connection_limit";
    pub const SET_CONNECTION_LIMIT: &str = "LocalLB.NodeAddressV2.set_connection_limit";
    pub const GET_DESCRIPTION: &str = "LocalLB.NodeAddressV2.get_description";
    pub const SET_DESCRIPTION: &str = "LocalLB.NodeAddressV2.set_description";
    pub const GET_DYNAMIC_RATIO: &str = "LocalLB.NodeAddressV2.get_dynamic_ratio_v2";
    pub const SET_DYNAMIC_RATIO: &str = "LocalLB.NodeAddressV2.set_dynamic_ratio_v2";
    pub const GET_RATE_LIMIT: &str = "LocalLB.NodeAddressV2.get_rate_limit";
    pub const SET_RATE_LIMIT: &str = "LocalLB.NodeAddressV2.set_rate_limit";
    pub const GET_RATIO: &str = "LocalLB.NodeAddressV2.get_ratio";
    pub const SET_RATIO: &str = "LocalLB.NodeAddressV2.set_ratio";
    pub const GET_SESSION_ENABLED_STATE: &str = "LocalLB.NodeAddressV2.get_session_enabled_state";
    pub const SET_SESSION_ENABLED_STATE: &str = "LocalLB.NodeAddressV2.set_session_enabled_state";
    pub const GET_OBJECT_STATUS: &str = "LocalLB.NodeAddressV2.get_object_status";
}

pub mod rule {
    pub const GET_LIST: &str = "LocalLB.Rule.get_list";
    pub const CREATE: &str = "LocalLB.Rule.create";
    pub const MODIFY: &str = "LocalLB.Rule.modify_rule";
    pub const QUERY: &str = "LocalLB.Rule.query_rule";
    pub const DELETE: &str = "LocalLB.Rule.delete_rule";
    pub const GET_DESCRIPTION: &str = "LocalLB.Rule.get_description";
    pub const SET_DESCRIPTION: &str = "LocalLB.Rule.set_description";
    pub const GET_IGNORE_VERIFICATION: &str = "LocalLB.Rule.get_ignore_verification";
    pub const SET_IGNORE_VERIFICATION: &str = "LocalLB.Rule.set_ignore_verification";
}

pub mod virtual_server {
    pub const GET_LIST: &str = "LocalLB.VirtualServer.get_list";
    pub const DELETE: &str = "LocalLB.VirtualServer.delete_virtual_server";
    pub const GET_DESTINATION: &str = "LocalLB.VirtualServer.get_destination_v2";
    pub const GET_DEFAULT_POOL: &str = "LocalLB.VirtualServer.get_default_pool_name";
    pub const SET_DEFAULT_POOL: &str = "LocalLB.VirtualServer.set_default_pool_name";
    pub const GET_DESCRIPTION: &str = "LocalLB.VirtualServer.get_description";
    pub const SET_DESCRIPTION: &str = "LocalLB.VirtualServer.set_description";
    pub const GET_ENABLED_STATE: &str = "LocalLB.VirtualServer.get_enabled_state";
    pub const SET_ENABLED_STATE: &str = "LocalLB.VirtualServer.set_enabled_state";
    pub const GET_PROTOCOL: &str = "LocalLB.VirtualServer.get_protocol";
    pub const GET_TYPE: &str = "LocalLB.VirtualServer.get_type";
}
