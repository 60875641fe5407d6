pub const MSG_ENTER_CITY: &str = "Please enter a city name.";
pub const MSG_TYPE_CITY_FIRST: &str = "Please type a city name first.";
pub const MSG_CITY_ALREADY_FAVORITE: &str = "This city is already in favorites.";
pub const MSG_CITY_NOT_FOUND: &str = "City not found or misspelled.";
pub const MSG_NETWORK_GENERIC: &str = "A network error occurred. Please try again.";
pub const MSG_PERMISSION_DENIED: &str = "Permission to access location was denied.";
pub const MSG_ALREADY_CURRENT_LOCATION: &str =
    "Already showing weather for your current location.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    EnterCity,
    TypeCityFirst,
    AlreadyFavorite,
    NotFound,
    Permission,
    AlreadyCurrentLocation,
    Network,
}

#[must_use]
pub fn message_for(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::EnterCity => MSG_ENTER_CITY,
        MessageKind::TypeCityFirst => MSG_TYPE_CITY_FIRST,
        MessageKind::AlreadyFavorite => MSG_CITY_ALREADY_FAVORITE,
        MessageKind::NotFound => MSG_CITY_NOT_FOUND,
        MessageKind::Permission => MSG_PERMISSION_DENIED,
        MessageKind::AlreadyCurrentLocation => MSG_ALREADY_CURRENT_LOCATION,
        MessageKind::Network => MSG_NETWORK_GENERIC,
    }
}
