/// Canonicalises a spreadsheet header: lower-case, trimmed, `:` dropped and
/// every run of whitespace or punctuation collapsed into a single `_`.
pub fn normalize_header(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for ch in raw.trim().chars().flat_map(char::to_lowercase) {
        if ch == ':' {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(ch);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// A closed set of canonical columns with a synonym table.
pub trait CanonicalField: Copy + Ord + 'static {
    const TABLE: &'static [(Self, &'static [&'static str])];

    fn name(&self) -> &'static str;

    /// Resolves a raw header. The rank is the synonym position; lower ranks
    /// take precedence when several synonyms of one field are present.
    fn resolve(raw_header: &str) -> Option<(Self, usize)> {
        let key = normalize_header(raw_header);
        if key.is_empty() {
            return None;
        }
        Self::TABLE.iter().find_map(|(field, synonyms)| {
            synonyms
                .iter()
                .position(|candidate| *candidate == key)
                .map(|rank| (*field, rank))
        })
    }

    fn from_header(raw_header: &str) -> Option<Self> {
        Self::resolve(raw_header).map(|(field, _)| field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShipmentField {
    Id,
    Number,
    Status,
    OriginCity,
    OriginCountry,
    DestinationCity,
    DestinationCountry,
    DepartureTime,
    EstimatedDelivery,
    Carrier,
    CurrentTemperature,
    Contents,
    BillOfLading,
    SenderName,
    SenderRole,
    Organization,
    Phone,
    Email,
}

impl ShipmentField {
    pub fn is_timestamp(&self) -> bool {
        matches!(
            self,
            ShipmentField::DepartureTime | ShipmentField::EstimatedDelivery
        )
    }
}

impl CanonicalField for ShipmentField {
    const TABLE: &'static [(Self, &'static [&'static str])] = &[
        (ShipmentField::Id, &["id", "shipment_id", "tracking_id"]),
        (
            ShipmentField::Number,
            &["number", "shipment_number", "tracking_number"],
        ),
        (ShipmentField::Status, &["status", "shipment_status"]),
        (
            ShipmentField::OriginCity,
            &[
                "origin",
                "origin_city",
                "source",
                "from_city",
                "departure_city",
            ],
        ),
        (
            ShipmentField::OriginCountry,
            &["origin_country", "from_country", "source_country"],
        ),
        (
            ShipmentField::DestinationCity,
            &[
                "destination",
                "destination_city",
                "dest",
                "to_city",
                "arrival_city",
            ],
        ),
        (
            ShipmentField::DestinationCountry,
            &["destination_country", "to_country", "dest_country"],
        ),
        (
            ShipmentField::DepartureTime,
            &["departure_time", "departure_date", "ship_date", "start_time"],
        ),
        (
            ShipmentField::EstimatedDelivery,
            &[
                "estimated_delivery",
                "eta",
                "arrival_date",
                "delivery_date",
                "expected_delivery",
                "arrival_time",
            ],
        ),
        (
            ShipmentField::Carrier,
            &["carrier", "shipping_company", "logistics_provider"],
        ),
        (
            ShipmentField::CurrentTemperature,
            &["current_temperature", "temperature", "temp"],
        ),
        (
            ShipmentField::Contents,
            &["contents", "cargo", "items", "shipment_contents"],
        ),
        (
            ShipmentField::BillOfLading,
            &[
                "bill_of_lading",
                "bol",
                "tracking_document",
                "bill_of_lading_number",
            ],
        ),
        (
            ShipmentField::SenderName,
            &["sender_contact_name", "sender_name", "contact_name"],
        ),
        (ShipmentField::SenderRole, &["designation", "role"]),
        (ShipmentField::Organization, &["organization", "company"]),
        (ShipmentField::Phone, &["phone_number", "phone"]),
        (ShipmentField::Email, &["email", "email_address"]),
    ];

    fn name(&self) -> &'static str {
        match self {
            ShipmentField::Id => "id",
            ShipmentField::Number => "number",
            ShipmentField::Status => "status",
            ShipmentField::OriginCity => "origin.city",
            ShipmentField::OriginCountry => "origin.country",
            ShipmentField::DestinationCity => "destination.city",
            ShipmentField::DestinationCountry => "destination.country",
            ShipmentField::DepartureTime => "departure_time",
            ShipmentField::EstimatedDelivery => "estimated_delivery",
            ShipmentField::Carrier => "carrier",
            ShipmentField::CurrentTemperature => "current_temperature",
            ShipmentField::Contents => "contents",
            ShipmentField::BillOfLading => "bill_of_lading",
            ShipmentField::SenderName => "contacts.sender_name",
            ShipmentField::SenderRole => "contacts.role",
            ShipmentField::Organization => "contacts.organization",
            ShipmentField::Phone => "contacts.phone",
            ShipmentField::Email => "contacts.email",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReadingField {
    Timestamp,
    Location,
    Celsius,
    Fahrenheit,
    Status,
}

impl CanonicalField for ReadingField {
    const TABLE: &'static [(Self, &'static [&'static str])] = &[
        (ReadingField::Timestamp, &["timestamp", "time", "date_time"]),
        (ReadingField::Location, &["location", "place"]),
        (
            ReadingField::Celsius,
            &[
                "temperature_c",
                "temperature_celsius",
                "temp_c",
                "temperature",
                "value",
            ],
        ),
        (
            ReadingField::Fahrenheit,
            &["temperature_f", "temperature_fahrenheit", "temp_f"],
        ),
        (ReadingField::Status, &["status"]),
    ];

    fn name(&self) -> &'static str {
        match self {
            ReadingField::Timestamp => "timestamp",
            ReadingField::Location => "location",
            ReadingField::Celsius => "temperature_c",
            ReadingField::Fahrenheit => "temperature_f",
            ReadingField::Status => "status",
        }
    }
}
