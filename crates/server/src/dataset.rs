//! Hardcoded lookup data: five countries with their aliases and ten-odd
//! cities each.

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("deutschland", "DE"),
    ("germany", "DE"),
    ("österreich", "AT"),
    ("austria", "AT"),
    ("schweiz", "CH"),
    ("switzerland", "CH"),
    ("niederlande", "NL"),
    ("netherlands", "NL"),
    ("frankreich", "FR"),
    ("france", "FR"),
];

const DE_CITIES: &[(&str, &str)] = &[
    ("berlin", "10115"),
    ("hamburg", "20095"),
    ("münchen", "80331"),
    ("koeln", "50667"),
    ("köln", "50667"),
    ("frankfurt", "60311"),
    ("stuttgart", "70173"),
    ("düsseldorf", "40213"),
    ("leipzig", "04109"),
    ("dortmund", "44135"),
    ("borken", "48455"),
];

const AT_CITIES: &[(&str, &str)] = &[
    ("wien", "1010"),
    ("graz", "8010"),
    ("linz", "4020"),
    ("salzburg", "5020"),
    ("innsbruck", "6020"),
    ("klagenfurt", "9020"),
    ("villach", "9500"),
    ("wels", "4600"),
    ("st. pölten", "3100"),
    ("st poelten", "3100"),
];

const CH_CITIES: &[(&str, &str)] = &[
    ("zürich", "8001"),
    ("zurich", "8001"),
    ("genf", "1201"),
    ("geneva", "1201"),
    ("basel", "4001"),
    ("bern", "3001"),
    ("lausanne", "1003"),
    ("winterthur", "8400"),
    ("luzern", "6003"),
    ("lugano", "6900"),
    ("st. gallen", "9000"),
    ("st gallen", "9000"),
];

const NL_CITIES: &[(&str, &str)] = &[
    ("amsterdam", "1012"),
    ("rotterdam", "3011"),
    ("den haag", "2511"),
    ("utrecht", "3511"),
    ("eindhoven", "5611"),
    ("tilburg", "5038"),
    ("groningen", "9711"),
    ("almere", "1315"),
    ("breda", "4811"),
    ("nijmegen", "6511"),
];

const FR_CITIES: &[(&str, &str)] = &[
    ("paris", "75001"),
    ("marseille", "13001"),
    ("lyon", "69001"),
    ("toulouse", "31000"),
    ("nice", "06000"),
    ("nantes", "44000"),
    ("montpellier", "34000"),
    ("strasbourg", "67000"),
    ("bordeaux", "33000"),
    ("lille", "59000"),
];

/// ISO2 code for a country name or alias, case-insensitive.
pub fn country_iso2(name: &str) -> Option<&'static str> {
    let key = name.trim().to_lowercase();
    COUNTRY_ALIASES.iter().find(|(alias, _)| *alias == key).map(|(_, iso2)| *iso2)
}

pub fn postal_code(country: &str, city: &str) -> Option<&'static str> {
    let cities = match country.trim().to_uppercase().as_str() {
        "DE" => DE_CITIES,
        "AT" => AT_CITIES,
        "CH" => CH_CITIES,
        "NL" => NL_CITIES,
        "FR" => FR_CITIES,
        _ => return None,
    };
    let key = city.trim().to_lowercase();
    cities.iter().find(|(name, _)| *name == key).map(|(_, postal)| *postal)
}

#[cfg(test)]
mod tests {
    use super::{country_iso2, postal_code};

    #[test]
    fn aliases_resolve_regardless_of_case_and_padding() {
        assert_eq!(country_iso2("Deutschland"), Some("DE"));
        assert_eq!(country_iso2("  ÖSTERREICH "), Some("AT"));
        assert_eq!(country_iso2("Atlantis"), None);
    }

    #[test]
    fn cities_are_scoped_to_their_country() {
        assert_eq!(postal_code("de", "Berlin"), Some("10115"));
        assert_eq!(postal_code("FR", "nice"), Some("06000"));
        assert_eq!(postal_code("AT", "Berlin"), None);
        assert_eq!(postal_code("XX", "Berlin"), None);
    }
}
