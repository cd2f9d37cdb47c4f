//! NextGCore Core Utilities Library
//!
//! Packet buffer shared by the NAS and S1AP builders.

pub mod pkbuf; // Packet buffer (ogs-pkbuf.h)

pub use pkbuf::{
    OgsPkbuf, PkbufError, PkbufResult, PkbufSlot, CLUSTER_1024, CLUSTER_128, CLUSTER_2048,
    CLUSTER_256, CLUSTER_512, CLUSTER_8192,
};
