use crate::generic::ResourceDefinition;
use crate::resources::common;
use crate::schema::{Attribute, ElementKind, Schema, Validator};

fn cidr(pattern: &'static str, message: &'static str) -> Schema {
    Schema::new("").attribute(
        "cidr_address",
        Attribute::string()
            .required()
            .validator(Validator::regex(pattern, message)),
    )
}

pub fn resource() -> ResourceDefinition {
    let ip_range = Schema::new("IP range in CIDR notation")
        .attribute(
            "ipv4",
            Attribute::derived(
                "#microsoft.graph.iPv4CidrRange",
                cidr(r"^(\d{1,3}\.){3}\d{1,3}/\d{1,2}$", "must be an IPv4 CIDR range"),
            ),
        )
        .attribute(
            "ipv6",
            Attribute::derived(
                "#microsoft.graph.iPv6CidrRange",
                cidr(r"^[0-9a-fA-F:]+/\d{1,3}$", "must be an IPv6 CIDR range"),
            ),
        );

    let ip = Schema::new("")
        .attribute("is_trusted", Attribute::bool().optional().default_value(false))
        .attribute(
            "ip_ranges",
            Attribute::set_nested(ip_range)
                .required()
                .validator(Validator::SizeAtLeast { min: 1 }),
        );

    let country = Schema::new("")
        .attribute(
            "countries_and_regions",
            Attribute::set(ElementKind::String)
                .required()
                .description("ISO 3166-1 alpha-2 codes")
                .validator(Validator::SizeAtLeast { min: 1 }),
        )
        .attribute(
            "include_unknown_countries_and_regions",
            Attribute::bool().optional().default_value(false),
        )
        .attribute(
            "country_lookup_method",
            Attribute::string()
                .optional()
                .default_value("clientIpAddress")
                .validator(Validator::one_of(&["clientIpAddress", "authenticatorAppGps"])),
        );

    let schema = Schema::new("Named location referenced by Conditional Access")
        .attribute("id", common::id())
        .attribute(
            "display_name",
            Attribute::string().required().validator(Validator::length(1, 256)),
        )
        .attribute("ip", Attribute::derived("#microsoft.graph.ipNamedLocation", ip))
        .attribute(
            "country",
            Attribute::derived("#microsoft.graph.countryNamedLocation", country),
        )
        .attribute("created_date_time", common::created_date_time())
        .attribute("modified_date_time", common::last_modified_date_time());

    ResourceDefinition::new("named_location", "/identity/conditionalAccess/namedLocations", schema)
}
