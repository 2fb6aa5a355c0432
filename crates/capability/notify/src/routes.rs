//! 各事件的目标主题。

use crate::Topic;
use domain::Role;

pub fn alarm_triggered(building_id: &str) -> Vec<Topic> {
    vec![
        Topic::Role(Role::Dispatcher),
        Topic::Role(Role::Admin),
        Topic::Building(building_id.to_string()),
    ]
}

pub fn brigade_assigned(brigade_id: &str) -> Vec<Topic> {
    vec![
        Topic::Brigade(brigade_id.to_string()),
        Topic::Role(Role::Dispatcher),
    ]
}

pub fn brigade_status_updated(brigade_id: &str) -> Vec<Topic> {
    vec![
        Topic::Role(Role::Dispatcher),
        Topic::Brigade(brigade_id.to_string()),
    ]
}

pub fn change_request_processed(requested_by: &str) -> Vec<Topic> {
    vec![Topic::User(requested_by.to_string())]
}
