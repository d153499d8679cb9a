pub const MESSAGES_RECEIVED: &str = "catalog_sync_messages_received";
pub const MESSAGES_HANDLED: &str = "catalog_sync_messages_handled";
pub const MESSAGES_DROPPED: &str = "catalog_sync_messages_dropped";
pub const SIDE_EFFECT_FAILURES: &str = "catalog_sync_side_effect_failures";
pub const RECV_ERRORS: &str = "catalog_sync_recv_errors";
pub const OFFSET_STORE_ERRORS: &str = "catalog_sync_offset_store_errors";
pub const HANDLE_TIME: &str = "catalog_sync_handle_time_ms";
