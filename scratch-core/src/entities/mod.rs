pub mod card;
pub mod notification;
pub mod pool_epoch;

use scratch_sdk::objects::NotificationKind as SdkNotificationKind;

/// Notification kind for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `scratch_sdk::objects::NotificationKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "notification_kind")]
pub enum NotificationKind {
    Match,
    Card,
    System,
}

impl From<NotificationKind> for SdkNotificationKind {
    fn from(value: NotificationKind) -> Self {
        match value {
            NotificationKind::Match => SdkNotificationKind::Match,
            NotificationKind::Card => SdkNotificationKind::Card,
            NotificationKind::System => SdkNotificationKind::System,
        }
    }
}

impl From<SdkNotificationKind> for NotificationKind {
    fn from(value: SdkNotificationKind) -> Self {
        match value {
            SdkNotificationKind::Match => NotificationKind::Match,
            SdkNotificationKind::Card => NotificationKind::Card,
            SdkNotificationKind::System => NotificationKind::System,
        }
    }
}
