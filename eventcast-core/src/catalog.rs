//! WMO weather interpretation codes.
//! See: https://open-meteo.com/en/docs#weathervariables

pub const UNKNOWN_CONDITION: &str = "Unknown weather condition";

/// Human-readable description of a WMO weather code.
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => UNKNOWN_CONDITION,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [i32; 28] = [
        0, 1, 2, 3, 45, 48, 51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82,
        85, 86, 95, 96, 99,
    ];

    #[test]
    fn every_known_code_has_a_description() {
        for code in KNOWN {
            assert_ne!(describe(code), UNKNOWN_CONDITION, "code {code}");
        }
    }

    #[test]
    fn sample_descriptions() {
        assert_eq!(describe(0), "Clear sky");
        assert_eq!(describe(63), "Moderate rain");
        assert_eq!(describe(99), "Thunderstorm with heavy hail");
    }

    #[test]
    fn unmapped_codes_fall_back_to_sentinel() {
        assert_eq!(describe(4), UNKNOWN_CONDITION);
        assert_eq!(describe(-1), UNKNOWN_CONDITION);
        assert_eq!(describe(100), UNKNOWN_CONDITION);
    }
}
