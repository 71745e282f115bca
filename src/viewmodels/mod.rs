pub mod attendance_viewmodel;

pub use attendance_viewmodel::{AttendanceUi, AttendanceViewModel, Notice, Spawner};
