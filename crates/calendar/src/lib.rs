//! Academic calendar events and per-user notifications.

pub mod event;
pub mod notification;

pub use event::{parse_datetime, CalendarEvent, CalendarEventDraft, EventType, SubmitCalendarEvent};
pub use notification::{NewNotification, Notification};
