// Domain layer module exports
// Following Hexagonal Architecture and DDD principles
// Domain is independent of infrastructure concerns

pub mod notification;
pub mod repositories;
pub mod skills;
pub mod team;
pub mod user;
