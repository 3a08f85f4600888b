#![allow(clippy::derive_partial_eq_without_eq)]

pub mod blockscout {
    pub mod rrqueue {
        pub mod v1 {
            include!(concat!(env!("OUT_DIR"), "/blockscout.rrqueue.v1.rs"));
        }
    }

    pub mod health {
        pub mod v1 {
            include!(concat!(env!("OUT_DIR"), "/blockscout.health.v1.rs"));
        }
    }
}
