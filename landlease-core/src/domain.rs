//! Domain enums shared by the store, the gate and the HTTP layer.
//!
//! Every enum has a stable SCREAMING_SNAKE_CASE wire form used both in
//! JSON and in the database.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $wire)] $variant ),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            /// Case-insensitive, surrounding whitespace ignored
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase();
                match normalized.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(Error::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Which side of the marketplace a user is on
    Role("role") {
        Farmer => "FARMER",
        Landowner => "LANDOWNER",
    }
}

impl Role {
    /// Onboarding page for this role
    pub fn onboarding_path(&self) -> &'static str {
        match self {
            Role::Farmer => "/onboarding/farmer",
            Role::Landowner => "/onboarding/landowner",
        }
    }

    /// Dashboard page for this role
    pub fn dashboard_path(&self) -> &'static str {
        match self {
            Role::Farmer => "/farmer/dashboard",
            Role::Landowner => "/landowner/dashboard",
        }
    }

    /// Top-level page namespace reserved for this role
    pub fn namespace(&self) -> &'static str {
        match self {
            Role::Farmer => "/farmer",
            Role::Landowner => "/landowner",
        }
    }

    pub fn other(&self) -> Role {
        match self {
            Role::Farmer => Role::Landowner,
            Role::Landowner => Role::Farmer,
        }
    }
}

wire_enum! {
    FarmingType("farming type") {
        Subsistence => "SUBSISTENCE",
        Commercial => "COMMERCIAL",
        Organic => "ORGANIC",
        Mixed => "MIXED",
    }
}

wire_enum! {
    LandType("land type") {
        Agricultural => "AGRICULTURAL",
        Fallow => "FALLOW",
        Orchard => "ORCHARD",
        Pasture => "PASTURE",
    }
}

wire_enum! {
    /// Derived from leases, never stored
    LandStatus("land status") {
        Available => "AVAILABLE",
        Leased => "LEASED",
    }
}

wire_enum! {
    ApplicationStatus("application status") {
        Pending => "PENDING",
        Approved => "APPROVED",
        Rejected => "REJECTED",
        Withdrawn => "WITHDRAWN",
    }
}

wire_enum! {
    LeaseStatus("lease status") {
        Active => "ACTIVE",
        Completed => "COMPLETED",
        Terminated => "TERMINATED",
    }
}

wire_enum! {
    BidStatus("bid status") {
        Pending => "PENDING",
        Accepted => "ACCEPTED",
        Rejected => "REJECTED",
    }
}

wire_enum! {
    PaymentStatus("payment status") {
        Pending => "PENDING",
        Completed => "COMPLETED",
        Failed => "FAILED",
    }
}
