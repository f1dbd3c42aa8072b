mod app;
mod config;

mod domain {
    pub mod entities {
        pub mod grid;
        pub mod record;
        pub mod target_field;
    }
    pub mod error;
    pub mod header;
    pub mod ingest;
    pub mod normalize;
}

mod infra {
    pub mod import {
        pub mod csv;
        pub mod xlsx;
    }
    pub mod json {
        pub mod repo;
    }
    pub mod sheet {
        pub mod xlsx;
    }
}

mod ui {
    pub mod state {
        pub mod app_state;
    }
}

mod usecase {
    pub mod ports {
        pub mod sheet;
        pub mod store;
    }
    pub mod services {
        pub mod fill_service;
        pub mod import_service;
    }
}

#[cfg(test)]
mod tests;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let webview_data_dir = config::default_webview_data_dir()
        .expect("should resolve and create WebView2 data directory");

    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            dioxus::desktop::Config::new()
                .with_window(dioxus::desktop::WindowBuilder::new().with_title("Shipfill"))
                .with_data_directory(webview_data_dir),
        )
        .launch(app::App);
}
