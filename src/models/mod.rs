pub mod user;
pub mod attendance;
pub mod scan;

pub use user::User;
pub use attendance::{CheckInRequest, CheckInResponse, TodayAttendanceResponse};
pub use scan::{DecodedResult, Point};
