pub mod display_task;
pub mod time_base_task;
pub mod touch_task;
pub mod trip_task;
