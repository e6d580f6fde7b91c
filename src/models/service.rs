use chrono::Duration;

pub const DEFAULT_SERVICE: &str = "Premium Haircut";
pub const DEFAULT_DURATION_MINUTES: i64 = 30;

/// Services offered on the booking page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookableService {
    PremiumHaircut,
    BasicKidsCut,
    HouseCall,
    SameDay,
}

impl BookableService {
    pub const ALL: [BookableService; 4] = [
        BookableService::PremiumHaircut,
        BookableService::BasicKidsCut,
        BookableService::HouseCall,
        BookableService::SameDay,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            BookableService::PremiumHaircut => "Premium Haircut",
            BookableService::BasicKidsCut => "Basic Kids Cut",
            BookableService::HouseCall => "House Call Service",
            BookableService::SameDay => "Same Day Appointment",
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        match self {
            BookableService::PremiumHaircut
            | BookableService::BasicKidsCut
            | BookableService::HouseCall
            | BookableService::SameDay => 30,
        }
    }

    pub fn from_title(title: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|service| service.title().eq_ignore_ascii_case(title.trim()))
    }
}

/// Appointment length for a service name; unknown names get the default.
pub fn service_duration(service: &str) -> Duration {
    let minutes = BookableService::from_title(service)
        .map(|s| s.duration_minutes())
        .unwrap_or(DEFAULT_DURATION_MINUTES);
    Duration::minutes(minutes)
}
