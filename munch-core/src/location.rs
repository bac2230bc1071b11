//! Location assistant contract and address composition.
//!
//! Lookups are best effort: implementations return `None` on any failure and
//! checkout never waits on them.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Coarse location from an IP lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLocation {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default, alias = "postal")]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl NetworkLocation {
    /// `city, region, postal, country`, skipping blanks. `None` when nothing is known.
    #[must_use]
    pub fn display(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.postal_code, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// External address lookup. Never raises to the caller.
#[async_trait::async_trait(?Send)]
pub trait LocationAssistant {
    /// Reverse geocode a coordinate fix into a display address.
    async fn lookup_address(&self, coords: Coordinates) -> Option<String>;

    /// Approximate the customer's location from their network address.
    async fn lookup_by_network_address(&self) -> Option<NetworkLocation>;
}

/// Why no coordinate fix is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionUnavailable {
    /// The device or browser has no geolocation support.
    Unsupported,
    /// The fix was refused, timed out or failed.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Unable to detect location automatically.")]
    DetectionUnavailable,
    #[error("Please allow location access or try again.")]
    AccessNeeded,
}

/// Values for the two address fields on the checkout form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedAddress {
    /// Longer text for the delivery-location box.
    pub delivery_location: String,
    /// Plain address for the customer-address field.
    pub customer_address: String,
}

impl DetectedAddress {
    #[must_use]
    pub fn from_fix(coords: Coordinates, address: Option<&str>) -> Self {
        let link = maps_link(coords);
        match address.map(str::trim).filter(|a| !a.is_empty()) {
            Some(address) => Self {
                delivery_location: format!("📍 Address: {address}\n🔗 Google Maps: {link}"),
                customer_address: address.to_string(),
            },
            None => Self {
                delivery_location: format!("🔗 Google Maps: {link}"),
                customer_address: link,
            },
        }
    }

    #[must_use]
    pub fn from_network(display: String) -> Self {
        Self {
            delivery_location: display.clone(),
            customer_address: display,
        }
    }
}

#[must_use]
pub fn maps_link(coords: Coordinates) -> String {
    format!(
        "https://www.google.com/maps?q={},{}",
        coords.latitude, coords.longitude
    )
}

/// Resolve an address from a coordinate fix, falling back to an IP lookup.
///
/// A coordinate fix always yields something (at least a maps link). Without
/// one, a failed IP lookup produces the retry message matching the cause.
///
/// # Errors
///
/// Returns a [`LocationError`] when no fix was available and the IP lookup failed.
pub async fn detect_address<L: LocationAssistant>(
    assistant: &L,
    fix: Result<Coordinates, PositionUnavailable>,
) -> Result<DetectedAddress, LocationError> {
    match fix {
        Ok(coords) => {
            let address = assistant.lookup_address(coords).await;
            if address.is_none() {
                log::warn!("Reverse geocode failed for {coords:?}");
            }
            Ok(DetectedAddress::from_fix(coords, address.as_deref()))
        }
        Err(cause) => {
            let display = assistant
                .lookup_by_network_address()
                .await
                .and_then(|loc| loc.display());
            display.map(DetectedAddress::from_network).ok_or_else(|| {
                log::warn!("IP location fallback failed after {cause:?}");
                match cause {
                    PositionUnavailable::Unsupported => LocationError::DetectionUnavailable,
                    PositionUnavailable::Failed => LocationError::AccessNeeded,
                }
            })
        }
    }
}
