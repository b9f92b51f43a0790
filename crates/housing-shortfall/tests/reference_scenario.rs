use housing_shortfall::estimate::{
    AgeBracketAggregator, AnnualConstruction, Completions, ConstructionSeries, DemolitionRatio,
    EstimationError, EstimationStage, HouseholdCategory, HouseholdSizeConstants,
    HouseholdSizeTable, ShapeMismatchError, ValidationError,
};
use std::collections::BTreeMap;
use housing_shortfall::reference_2024;

fn assert_close(actual: f64, expected: f64, tolerance: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "{what}: expected {expected}, got {actual}"
    );
}

#[test]
fn dwelling_stock_matches_documented_arithmetic() {
    let report = reference_2024().evaluate().expect("reference scenario evaluates");

    assert_close(report.demolition_ratio, 22_000.0 / 177_000.0, 1e-15, "demolition ratio");
    assert_eq!(report.demolition_ratio + report.net_construction_ratio, 1.0);

    let stock = &report.stock;
    assert_eq!(stock.points.len(), 4);
    assert_close(stock.year_end(2021).expect("2021 year end"), 10_914_754.440_677_967, 1.0, "2021");
    assert_close(stock.year_end(2022).expect("2022 year end"), 11_067_066.022_598_87, 1.0, "2022");
    assert_close(stock.year_end(2023).expect("2023 year end"), 11_221_264.751_412_429, 1.0, "2023");
    assert_close(stock.at_target(), 11_298_764.751_412_429, 1.0, "30 June 2024");

    // 2024 uses the published net figure: half of 155,000.
    let last = stock.points.last().expect("target point present");
    assert_eq!(last.net_construction_applied, 77_500.0);
}

#[test]
fn stock_timeline_is_non_decreasing() {
    let report = reference_2024().evaluate().expect("reference scenario evaluates");
    let counts: Vec<f64> = report
        .stock
        .points
        .iter()
        .map(|point| point.dwelling_count)
        .collect();
    assert!(counts.windows(2).all(|pair| pair[1] >= pair[0]));
    assert!(counts[0] >= report.stock.baseline.dwelling_count as f64);
}

#[test]
fn reference_population_brackets_preserve_total() {
    let scenario = reference_2024();
    let brackets = AgeBracketAggregator::aggregate(scenario.age_distribution.counts())
        .expect("reference distribution has 101 ages");

    let expected = [
        1_510_090, 1_610_542, 1_674_276, 1_661_944, 1_788_041, 1_993_635, 2_037_179, 1_984_476,
        1_851_264, 1_628_162, 1_689_237, 1_533_427, 1_533_966, 1_359_091, 1_174_210, 972_111,
        611_366, 580_773,
    ];
    let actual: Vec<u64> = brackets.populations().collect();
    assert_eq!(actual, expected);
    assert_eq!(brackets.total(), 27_193_790);
}

#[test]
fn household_size_constants_fall_between_two_and_three() {
    let scenario = reference_2024();
    let sizes = HouseholdSizeConstants::from_tables(&scenario.household_sizes)
        .expect("reference size tables are valid");

    assert_close(sizes.other_family, 2.318_273_647_754_876, 1e-12, "other family");
    assert_close(sizes.group_household, 2.332_121_562_995_767, 1e-12, "group");
    for size in [sizes.other_family, sizes.group_household] {
        assert!(size > 2.0 && size < 3.0);
    }
}

#[test]
fn end_to_end_reports_a_shortage() {
    let report = reference_2024().evaluate().expect("reference scenario evaluates");
    let shortfall = report.shortfall;

    assert_close(report.household_demand.total_households, 11_126_762.171_636_282, 1.0, "households");
    assert_close(shortfall.usable_dwellings, 11_203_839.751_412_43, 1.0, "usable dwellings");
    assert_close(
        shortfall.adjustments.rental_vacancy_buffer,
        102_143.676_735_621,
        0.01,
        "rental vacancy buffer",
    );
    assert_eq!(shortfall.adjustments.sale_inventory_buffer, 274_573.5);
    assert_close(shortfall.total_required, 11_503_479.348_371_902, 1.0, "total required");
    assert_close(shortfall.net_shortfall, -299_639.596_959_47, 1.0, "net shortfall");

    assert!(shortfall.is_shortage());
    assert!(shortfall.shortage() > 100_000.0 && shortfall.shortage() < 10_000_000.0);
}

#[test]
fn category_breakdown_sums_to_total() {
    let report = reference_2024().evaluate().expect("reference scenario evaluates");
    let demand = &report.household_demand;

    assert_eq!(demand.by_category.len(), HouseholdCategory::ordered().len());
    let summed: f64 = demand.by_category.iter().map(|entry| entry.households).sum();
    assert_close(summed, demand.total_households, 1e-3, "category sum");
}

#[test]
fn demolition_override_changes_only_estimated_years() {
    let baseline = reference_2024().evaluate().expect("reference scenario evaluates");
    let no_demolition = reference_2024()
        .with_demolition_ratio(DemolitionRatio::new(0.0).expect("valid ratio"))
        .evaluate()
        .expect("override evaluates");

    assert!(no_demolition.stock.at_target() > baseline.stock.at_target());
    let last = no_demolition.stock.points.last().expect("target point");
    assert_eq!(last.net_construction_applied, 77_500.0);
    assert_eq!(
        no_demolition.household_demand.total_households,
        baseline.household_demand.total_households
    );
}

#[test]
fn malformed_propensities_fail_at_household_stage() {
    let mut scenario = reference_2024();
    scenario
        .propensities
        .rows
        .insert(HouseholdCategory::FemaleLonePerson, vec![1.0; 12]);

    match scenario.evaluate() {
        Err(EstimationError::ShapeMismatch {
            stage: EstimationStage::HouseholdDemand,
            source: ShapeMismatchError::PropensityColumns { found: 12, .. },
        }) => {}
        other => panic!("expected propensity shape mismatch, got {other:?}"),
    }
}

#[test]
fn oversized_completions_fail_at_stock_stage() {
    let mut scenario = reference_2024();
    let entries = scenario
        .construction
        .entries()
        .iter()
        .map(|entry| match entry.completions {
            Completions::QuarterlyGross(_) if entry.year == 2021 => {
                AnnualConstruction::quarterly_gross(2021, [u64::MAX, 1, 0, 0])
            }
            _ => *entry,
        })
        .collect();
    scenario.construction = ConstructionSeries::new(entries).expect("years stay ordered");

    match scenario.evaluate() {
        Err(EstimationError::Validation {
            stage: EstimationStage::DwellingStock,
            source: ValidationError::Overflow { .. },
        }) => {}
        other => panic!("expected stock overflow, got {other:?}"),
    }
}

#[test]
fn oversized_size_table_fails_at_household_stage() {
    let mut scenario = reference_2024();
    scenario.household_sizes.group_household =
        HouseholdSizeTable::new(BTreeMap::from([(6, u64::MAX / 2)]));

    match scenario.evaluate() {
        Err(EstimationError::Validation {
            stage: EstimationStage::HouseholdDemand,
            source: ValidationError::Overflow { .. },
        }) => {}
        other => panic!("expected size table overflow, got {other:?}"),
    }
}
