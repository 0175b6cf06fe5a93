pub mod config;
pub mod db;
pub mod error;
pub mod routes;
pub mod state;
pub mod views;

pub mod crypto {
    pub mod csrf;
}

pub mod models {
    pub mod record;
    pub mod session;
}

pub mod repositories {
    pub mod memory;
    pub mod record;
    pub mod session;
}

pub mod services {
    pub mod analysis;
    pub mod history;
    pub mod history_board;
    pub mod identity;
    pub mod records;
    pub mod session_gate;
    pub mod submission;
    pub mod submit_control;
}

pub mod handlers {
    pub mod auth;
    pub mod page;
    pub mod records;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod csrf;
    pub mod rate_limit;
}

pub mod validation {
    pub mod auth;
}
