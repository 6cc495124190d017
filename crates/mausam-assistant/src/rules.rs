//! Keyword rule engine.
//!
//! Questions are matched against an ordered table of topics. The first topic
//! with a trigger word contained anywhere in the lower-cased question answers
//! it; questions that match nothing get a general summary.

use mausam_weather::{CurrentWeather, HourlyWeather, WeatherSnapshot};

/// Hourly samples considered when judging rain chances.
pub(crate) const RAIN_WINDOW: usize = 12;

/// Hourly samples considered when judging the temperature trend.
const TREND_WINDOW: usize = 6;

/// A maximum precipitation probability above this means rain is likely.
const RAIN_LIKELY_PERCENT: f64 = 40.0;

/// Change in °C across the trend window that counts as rising or falling.
const TREND_DELTA_C: f64 = 2.0;

const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Map a bearing in degrees to one of 16 compass points.
pub fn compass(degrees: f64) -> &'static str {
    let sector = (degrees / 22.5).round_ties_even() as i64;
    COMPASS_POINTS[sector.rem_euclid(16) as usize]
}

/// Current readings with absent fields filled in.
///
/// Missing values read as zero, except feels-like which falls back to the
/// air temperature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub precipitation: f64,
    pub cloud_cover: f64,
    pub pressure: f64,
}

impl From<&CurrentWeather> for Readings {
    fn from(c: &CurrentWeather) -> Self {
        let temp = c.temperature_c.unwrap_or(0.0);
        Self {
            temp,
            feels_like: c.feels_like_c.unwrap_or(temp),
            humidity: c.humidity.unwrap_or(0.0),
            wind_speed: c.windspeed_kph.unwrap_or(0.0),
            wind_direction: c.winddirection.unwrap_or(0.0),
            precipitation: c.precipitation.unwrap_or(0.0),
            cloud_cover: c.cloud_cover.unwrap_or(0.0),
            pressure: c.pressure_hpa.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempTrend {
    Rising,
    Falling,
    Stable,
}

/// Signals derived from the hourly window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outlook {
    pub max_precip_prob: f64,
    pub avg_precip_prob: f64,
    pub will_rain: bool,
    pub temp_trend: TempTrend,
}

impl Outlook {
    pub fn from_hourly(hourly: &[HourlyWeather]) -> Self {
        let probs: Vec<f64> = hourly
            .iter()
            .take(RAIN_WINDOW)
            .filter_map(|h| h.precipitation_probability)
            .collect();

        let max_precip_prob = probs.iter().copied().fold(0.0, f64::max);
        let avg_precip_prob = if probs.is_empty() {
            0.0
        } else {
            probs.iter().sum::<f64>() / probs.len() as f64
        };

        let temps: Vec<f64> = hourly
            .iter()
            .take(TREND_WINDOW)
            .filter_map(|h| h.temperature_c)
            .collect();

        let temp_trend = match (temps.first(), temps.last()) {
            (Some(&first), Some(&last)) if temps.len() >= 2 => {
                if last > first + TREND_DELTA_C {
                    TempTrend::Rising
                } else if last < first - TREND_DELTA_C {
                    TempTrend::Falling
                } else {
                    TempTrend::Stable
                }
            }
            _ => TempTrend::Stable,
        };

        Self {
            max_precip_prob,
            avg_precip_prob,
            will_rain: max_precip_prob > RAIN_LIKELY_PERCENT,
            temp_trend,
        }
    }
}

/// Everything a rule can draw on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conditions {
    pub now: Readings,
    pub outlook: Outlook,
}

impl From<&WeatherSnapshot> for Conditions {
    fn from(snapshot: &WeatherSnapshot) -> Self {
        Self {
            now: Readings::from(&snapshot.current),
            outlook: Outlook::from_hourly(&snapshot.hourly),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Rain,
    Temperature,
    Wind,
    Clothing,
    Activity,
    Sky,
    Humidity,
    Pressure,
}

struct Rule {
    topic: Topic,
    triggers: &'static [&'static str],
    respond: fn(&Conditions) -> String,
}

/// Topics in precedence order.
static RULES: [Rule; 8] = [
    Rule {
        topic: Topic::Rain,
        triggers: &[
            "rain", "raining", "rainy", "umbrella", "wet", "precipitation", "drizzle", "shower",
            "downpour", "pour",
        ],
        respond: rain,
    },
    Rule {
        topic: Topic::Temperature,
        triggers: &[
            "temperature", "hot", "cold", "warm", "cool", "degree", "celsius", "heat", "freeze",
            "freezing",
        ],
        respond: temperature,
    },
    Rule {
        topic: Topic::Wind,
        triggers: &["wind", "windy", "breeze", "breezy", "gust", "blow", "blowing"],
        respond: wind,
    },
    Rule {
        topic: Topic::Clothing,
        triggers: &[
            "wear", "clothing", "clothes", "dress", "outfit", "jacket", "coat", "shirt", "pants",
        ],
        respond: clothing,
    },
    Rule {
        topic: Topic::Activity,
        triggers: &[
            "activity", "activities", "do", "plan", "outdoor", "outside", "go out", "outing",
            "picnic", "hike", "walk", "run", "exercise", "sport",
        ],
        respond: activity,
    },
    Rule {
        topic: Topic::Sky,
        triggers: &["cloud", "cloudy", "overcast", "sky", "clear", "sunny", "sun"],
        respond: sky,
    },
    Rule {
        topic: Topic::Humidity,
        triggers: &["humid", "humidity", "muggy", "sticky", "damp", "moisture"],
        respond: humidity,
    },
    Rule {
        topic: Topic::Pressure,
        triggers: &["pressure", "barometric", "atmospheric"],
        respond: pressure,
    },
];

fn matching_rule(question: &str) -> Option<&'static Rule> {
    let question = question.trim().to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| question.contains(t)))
}

/// The topic a question is about, if any trigger word matches.
pub fn classify(question: &str) -> Option<Topic> {
    matching_rule(question).map(|rule| rule.topic)
}

/// Answer a question from the given conditions.
pub fn respond(question: &str, conditions: &Conditions) -> String {
    match matching_rule(question) {
        Some(rule) => {
            tracing::debug!("Answering as {:?}", rule.topic);
            (rule.respond)(conditions)
        }
        None => summary(conditions),
    }
}

fn rain(c: &Conditions) -> String {
    let Conditions { now, outlook } = c;

    if now.precipitation > 0.0 {
        let mut answer = format!(
            "Yes, it's currently raining with {}mm of precipitation. ",
            now.precipitation
        );
        if outlook.max_precip_prob > 60.0 {
            answer.push_str(&format!(
                "And it's likely to continue - {}% chance in the next 12 hours. ",
                outlook.max_precip_prob
            ));
        }
        answer.push_str("I recommend carrying an umbrella and wearing waterproof clothing.");
        answer
    } else if outlook.will_rain {
        let mut answer = format!(
            "Not raining right now, but there's a {}% chance of rain in the next 12 hours (average {:.0}%). ",
            outlook.max_precip_prob, outlook.avg_precip_prob
        );
        if outlook.max_precip_prob > 70.0 {
            answer.push_str("Better carry an umbrella - rain is very likely!");
        } else {
            answer.push_str("You might want to carry an umbrella just in case.");
        }
        answer
    } else {
        let mut answer = format!(
            "No rain expected! Current conditions are clear with only a {}% chance of rain. ",
            outlook.max_precip_prob
        );
        if now.cloud_cover > 50.0 {
            answer.push_str(&format!(
                "Though it's {}% cloudy, precipitation is unlikely.",
                now.cloud_cover
            ));
        } else {
            answer.push_str("You can leave the umbrella at home.");
        }
        answer
    }
}

fn temperature(c: &Conditions) -> String {
    let now = &c.now;
    let mut answer = format!(
        "The temperature is {}°C (feels like {}°C). ",
        now.temp, now.feels_like
    );

    match c.outlook.temp_trend {
        TempTrend::Rising => answer.push_str("It's getting warmer. "),
        TempTrend::Falling => answer.push_str("It's getting cooler. "),
        TempTrend::Stable => {}
    }

    answer.push_str(if now.temp > 35.0 {
        "Very hot! Stay hydrated, wear light clothing, and avoid direct sun during peak hours. Seek shade and air conditioning."
    } else if now.temp > 28.0 {
        "Warm weather. Light, breathable clothing recommended. Don't forget sunscreen and stay hydrated!"
    } else if now.temp > 20.0 {
        "Pleasant temperature - perfect for outdoor activities. Light layers recommended."
    } else if now.temp > 10.0 {
        "Cool weather. Consider wearing a light jacket or sweater."
    } else if now.temp > 0.0 {
        "Cold! Dress warmly with layers, jacket, and possibly a scarf."
    } else {
        "Freezing temperatures! Bundle up with heavy winter clothing, hat, gloves, and scarf."
    });

    answer
}

fn wind(c: &Conditions) -> String {
    let now = &c.now;
    let mut answer = format!(
        "Wind is blowing at {} km/h from the {} ({}°). ",
        now.wind_speed,
        compass(now.wind_direction),
        now.wind_direction
    );

    answer.push_str(if now.wind_speed > 40.0 {
        "Very windy! Secure loose objects, be cautious outdoors. Not ideal for outdoor activities. Strong winds can be dangerous."
    } else if now.wind_speed > 25.0 {
        "Moderately windy. You'll feel a noticeable breeze. Good for kite flying, but secure light objects."
    } else if now.wind_speed > 10.0 {
        "Light breeze. Pleasant conditions with gentle wind. Perfect for outdoor activities."
    } else {
        "Calm conditions with minimal wind. Great for outdoor dining, picnics, or any outdoor activity!"
    });

    answer
}

fn clothing(c: &Conditions) -> String {
    let Conditions { now, outlook } = c;
    let mut picks: Vec<&str> = Vec::new();

    if now.temp > 30.0 {
        picks.push("light, breathable fabrics like cotton or linen");
        picks.push("shorts and t-shirts");
    } else if now.temp > 25.0 {
        picks.push("comfortable summer clothing");
    } else if now.temp > 20.0 {
        picks.push("light casual wear");
    } else if now.temp > 15.0 {
        picks.push("light jacket or cardigan");
    } else if now.temp > 10.0 {
        picks.push("sweater or hoodie");
    } else if now.temp > 0.0 {
        picks.push("warm jacket and layers");
    } else {
        picks.push("heavy winter coat, hat, gloves, and scarf");
    }

    if outlook.will_rain || now.precipitation > 0.0 {
        picks.push("waterproof jacket or umbrella");
    }
    if now.wind_speed > 20.0 {
        picks.push("windbreaker");
    }
    if now.temp > 28.0 && now.cloud_cover < 50.0 {
        picks.push("sunglasses, hat, and sunscreen");
    }
    if now.humidity > 70.0 {
        picks.push("moisture-wicking fabrics");
    }

    let mut answer = format!(
        "Based on {}°C (feels like {}°C) and current conditions, I recommend: {}. ",
        now.temp,
        now.feels_like,
        picks.join(", ")
    );
    if outlook.will_rain {
        answer.push_str(&format!(
            "There's a {}% chance of rain, so definitely bring rain protection!",
            outlook.max_precip_prob
        ));
    }
    answer
}

fn activity(c: &Conditions) -> String {
    let Conditions { now, outlook } = c;

    if now.precipitation > 0.0 || outlook.will_rain {
        let state = if now.precipitation > 0.0 { "is falling" } else { "is likely" };
        return format!(
            "Rain {} ({}% chance). Indoor activities recommended: museums, shopping malls, cafes, movie theaters, or indoor sports facilities.",
            state, outlook.max_precip_prob
        );
    }
    if now.temp > 35.0 {
        return format!(
            "Very hot ({}°C). Best activities: swimming, water parks, indoor activities with AC, or wait until evening. If going out, stay in shade, hydrate frequently, and take breaks.",
            now.temp
        );
    }
    if now.temp < 5.0 {
        return format!(
            "Very cold ({}°C). Good for: indoor activities, warm cafes, ice skating (if available), or bundled-up winter walks. Keep outdoor time limited.",
            now.temp
        );
    }
    if now.wind_speed > 35.0 {
        return format!(
            "Very windy ({} km/h). Indoor activities safer. If going out, secure belongings, avoid tall structures, and be cautious near trees.",
            now.wind_speed
        );
    }

    let mut answer = String::from(
        "Great weather! Perfect for: outdoor sports, picnics, hiking, cycling, jogging, sightseeing, or park visits. ",
    );
    if now.temp > 25.0 {
        answer.push_str("Morning or evening activities recommended to avoid peak heat.");
    } else if now.temp < 15.0 {
        answer.push_str("Dress warmly for outdoor activities.");
    }
    answer
}

fn sky(c: &Conditions) -> String {
    let Conditions { now, outlook } = c;
    let cover = now.cloud_cover;

    let mut answer = if cover < 20.0 {
        let mut s = format!(
            "Clear skies with only {}% cloud cover. Perfect sunny weather! ",
            cover
        );
        if now.temp > 28.0 {
            s.push_str("Don't forget sunscreen and sunglasses.");
        }
        s
    } else if cover < 50.0 {
        format!("Partly cloudy with {}% cloud cover. Mix of sun and clouds. ", cover)
    } else if cover < 80.0 {
        format!("Mostly cloudy with {}% cloud cover. Limited sunshine. ", cover)
    } else {
        format!("Overcast with {}% cloud cover. Very cloudy skies. ", cover)
    };

    if outlook.will_rain {
        answer.push_str(&format!(
            "Rain is possible ({}% chance).",
            outlook.max_precip_prob
        ));
    }
    answer
}

fn humidity(c: &Conditions) -> String {
    let h = c.now.humidity;
    let mut answer = format!("Humidity is at {}%. ", h);

    answer.push_str(if h > 80.0 {
        "Very humid and uncomfortable. The air feels heavy and sticky. Wear breathable fabrics and stay hydrated."
    } else if h > 60.0 {
        "Moderately humid. You'll notice the moisture in the air. Light, breathable clothing recommended."
    } else if h > 40.0 {
        "Comfortable humidity levels. Not too dry, not too humid."
    } else {
        "Low humidity - the air is quite dry. Good for outdoor activities, but stay hydrated."
    });

    answer
}

fn pressure(c: &Conditions) -> String {
    let p = c.now.pressure;
    let mut answer = format!("Atmospheric pressure is {} hPa. ", p);

    answer.push_str(if p > 1020.0 {
        "High pressure - typically associated with clear, stable weather."
    } else if p > 1010.0 {
        "Normal pressure - stable weather conditions."
    } else {
        "Low pressure - often associated with unsettled weather and possible precipitation."
    });

    answer
}

fn summary(c: &Conditions) -> String {
    let Conditions { now, outlook } = c;
    let mut notes = Vec::new();

    notes.push(if now.temp > 30.0 {
        format!("hot at {}°C", now.temp)
    } else if now.temp > 20.0 {
        format!("pleasant at {}°C", now.temp)
    } else if now.temp < 15.0 {
        format!("cool at {}°C", now.temp)
    } else {
        format!("{}°C", now.temp)
    });

    if now.humidity > 70.0 {
        notes.push(format!("{}% humidity (humid)", now.humidity));
    }
    if now.wind_speed > 20.0 {
        notes.push(format!("windy at {} km/h", now.wind_speed));
    }
    if now.cloud_cover > 70.0 {
        notes.push(format!("{}% cloudy", now.cloud_cover));
    }
    if outlook.will_rain {
        notes.push(format!("{}% chance of rain", outlook.max_precip_prob));
    }

    let mut answer = format!(
        "Current weather: {}. Feels like {}°C. ",
        notes.join(", "),
        now.feels_like
    );

    if now.precipitation > 0.0 {
        answer.push_str(&format!("Currently raining ({}mm). ", now.precipitation));
    } else if outlook.will_rain {
        answer.push_str(&format!(
            "Rain possible in next 12 hours ({}% chance). ",
            outlook.max_precip_prob
        ));
    }

    match outlook.temp_trend {
        TempTrend::Rising => answer.push_str("Temperature is rising. "),
        TempTrend::Falling => answer.push_str("Temperature is falling. "),
        TempTrend::Stable => {}
    }

    answer.push_str("\n\nFeel free to ask me specific questions about temperature, rain, wind, clothing, activities, or anything else weather-related!");
    answer
}
