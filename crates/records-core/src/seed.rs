//! Fixture records (task1..task5) used by tests and the demo binary.

use crate::domain::{NewRecord, Status};

pub fn records() -> Vec<NewRecord> {
    vec![
        NewRecord::new("task1", Status::Incomplete),
        NewRecord::new("task2", Status::Completed),
        NewRecord::new("task3", Status::Incomplete),
        NewRecord::new("task4", Status::Incomplete),
        NewRecord::new("task5", Status::Completed),
    ]
}
