//! Subscription input/output
//!
//! A subscribe callback is called twice per path, once per
//! [`SubscProcType`]. It reads [`XfmrSubscInParams`] and writes into a
//! caller-owned [`XfmrSubscOutParams`], so anything it sets before
//! returning an error (notably the notification preference) is still seen
//! by the dispatcher.

use xfmr_core::{DbDataMap, DbSet, NotificationType, SubscProcType};

/// Notification preference for a subscribed path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NotificationOpts {
    /// Minimum interval between notifications, in seconds
    pub min_interval: u32,
    /// Delivery mode
    pub p_type: NotificationType,
}

impl NotificationOpts {
    /// Sampled delivery at the given interval
    pub fn sample(min_interval: u32) -> Self {
        Self {
            min_interval,
            p_type: NotificationType::Sample,
        }
    }

    /// Delivery on every change
    pub fn on_change() -> Self {
        Self {
            min_interval: 0,
            p_type: NotificationType::OnChange,
        }
    }
}

/// Input to a subscribe callback
#[derive(Debug, Clone, Copy)]
pub struct XfmrSubscInParams<'a> {
    /// Subscribed path
    pub uri: &'a str,
    /// Handle array
    pub dbs: &'a DbSet,
    /// Changed records (PROCESS) or the previously cached snapshot when the
    /// path asked for caching; empty on TRANSLATE
    pub db_data_map: &'a DbDataMap,
    /// Which phase is running
    pub subsc_proc: SubscProcType,
}

/// Output of a subscribe callback
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XfmrSubscOutParams {
    /// Watch set (TRANSLATE) or recomputed value (PROCESS)
    pub db_data_map: DbDataMap,
    /// Keep this output and pass it to the next PROCESS call for the path
    pub need_cache: bool,
    /// Notify on every change
    pub on_change: bool,
    /// Requested notification preference
    pub n_opts: Option<NotificationOpts>,
    /// The path has no direct table mapping
    pub is_virtual_tbl: bool,
}
