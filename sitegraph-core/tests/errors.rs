use std::sync::Arc;

use rstest::rstest;
use sitegraph_core::{
    GeometryError, GeometryErrorCode, NeighborhoodId, SiteGraphError, SiteGraphErrorCode, SiteId,
};

#[rstest]
#[case(GeometryError::EmptyPolygon { site: SiteId::new(1) }, GeometryErrorCode::EmptyPolygon)]
#[case(
    GeometryError::NonFiniteCoordinate { site: SiteId::new(1) },
    GeometryErrorCode::NonFiniteCoordinate,
)]
#[case(
    GeometryError::DegenerateArea { site: SiteId::new(1), area: 0.0, min_area: 1.0 },
    GeometryErrorCode::DegenerateArea,
)]
#[case(
    GeometryError::DuplicateGeometry { site: SiteId::new(1), original: SiteId::new(0) },
    GeometryErrorCode::DuplicateGeometry,
)]
#[case(
    GeometryError::NestedFootprint { site: SiteId::new(1), container: SiteId::new(0) },
    GeometryErrorCode::NestedFootprint,
)]
#[case(GeometryError::UnknownSite { site: SiteId::new(1) }, GeometryErrorCode::UnknownSite)]
fn returns_expected_geometry_code(
    #[case] error: GeometryError,
    #[case] expected: GeometryErrorCode,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.site(), SiteId::new(1));
    assert!(error.code().as_str().starts_with("GEOMETRY_"));
}

#[rstest]
#[case(SiteGraphError::InvalidSeedFraction { got: 0.0 }, SiteGraphErrorCode::InvalidSeedFraction, true)]
#[case(SiteGraphError::InvalidMinSites { got: 0 }, SiteGraphErrorCode::InvalidMinSites, true)]
#[case(
    SiteGraphError::InvalidRadius { name: "radius_step", got: -1.0 },
    SiteGraphErrorCode::InvalidRadius,
    true,
)]
#[case(SiteGraphError::InvalidMaxHops { got: 0 }, SiteGraphErrorCode::InvalidMaxHops, true)]
#[case(
    SiteGraphError::InvalidSplitRatios { train: 0.9, validation: 0.2 },
    SiteGraphErrorCode::InvalidSplitRatios,
    true,
)]
#[case(
    SiteGraphError::EmptySiteTable { table: Arc::from("sites") },
    SiteGraphErrorCode::EmptySiteTable,
    false,
)]
#[case(
    SiteGraphError::EmptySeedSet { sites: 3, fraction: 0.01 },
    SiteGraphErrorCode::EmptySeedSet,
    false,
)]
#[case(
    SiteGraphError::EmptyNeighborhoodSet { seeds: 2 },
    SiteGraphErrorCode::EmptyNeighborhoodSet,
    false,
)]
#[case(
    SiteGraphError::InconsistentMembership {
        neighborhood: NeighborhoodId::new(4),
        center: SiteId::new(9),
    },
    SiteGraphErrorCode::InconsistentMembership,
    false,
)]
#[case(
    SiteGraphError::Triangulation { message: Arc::from("collinear") },
    SiteGraphErrorCode::Triangulation,
    false,
)]
fn returns_expected_sitegraph_code(
    #[case] error: SiteGraphError,
    #[case] expected: SiteGraphErrorCode,
    #[case] configuration: bool,
) {
    assert_eq!(error.code(), expected);
    assert_eq!(error.code().as_str(), expected.as_str());
    assert_eq!(error.is_configuration(), configuration);
}

#[test]
fn messages_name_the_offending_value() {
    let message = SiteGraphError::EmptySeedSet {
        sites: 3,
        fraction: 0.01,
    }
    .to_string();
    assert!(message.contains('3'), "{message}");

    let message = SiteGraphError::InconsistentMembership {
        neighborhood: NeighborhoodId::new(4),
        center: SiteId::new(9),
    }
    .to_string();
    assert!(message.contains('4') && message.contains('9'), "{message}");
}
