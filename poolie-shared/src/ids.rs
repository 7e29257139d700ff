use uuid::Uuid;

/// Entity prefixes used for public identifiers, e.g. `ride_1a2b3c4d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Ride,
    Booking,
    Vehicle,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Ride => "ride",
            IdKind::Booking => "booking",
            IdKind::Vehicle => "vehicle",
        }
    }
}

/// Generate a short prefixed id from the first 8 hex digits of a v4 UUID.
pub fn new_id(kind: IdKind) -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("{}_{}", kind.prefix(), &raw[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_ids() {
        let id = new_id(IdKind::Booking);
        assert!(id.starts_with("booking_"));
        assert_eq!(id.len(), "booking_".len() + 8);
        assert!(id["booking_".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(new_id(IdKind::Ride), new_id(IdKind::Ride));
    }
}
