use crate::estimate::{
    AdjustmentInputs, AgeDistribution, AnnualConstruction, CensusBaseline, ConstructionSeries,
    DemolitionAssumption, DemolitionObservation, HouseholdCategory, HouseholdSizeTable,
    HouseholdSizeTables, PropensityTable, ReferenceDate, Scenario, YearFraction,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// ABS 2021 Census QuickStats, all private dwellings, counted 10 August 2021.
const CENSUS_DWELLINGS_2021: u64 = 10_852_208;

/// ABS Building Activity, table 37: dwelling units completed per quarter (gross).
const QUARTERLY_GROSS_COMPLETIONS: [(i32, [u64; 4]); 3] = [
    (2021, [39_051, 47_552, 45_601, 46_356]),
    (2022, [36_951, 43_896, 45_389, 47_694]),
    (2023, [38_678, 42_314, 45_257, 49_836]),
];

/// NHSAC State of the Housing System 2025: 2024 completions, gross and net.
const COMPLETIONS_2024_GROSS: u64 = 177_000;
const COMPLETIONS_2024_NET: u64 = 155_000;

/// ABS estimated resident population at 30 June 2024 by single year of age (0..99, 100+).
const AGE_DISTRIBUTION_2024: [u64; 101] = [
    290273, 294140, 314380, 306475, 304822, 312523, 315284, 322093, 331378, 329264, 332697, 335957,
    335843, 333212, 336567, 333839, 334432, 331089, 326702, 335882, 340771, 339951, 348670, 373366,
    385283, 386277, 393204, 399777, 404058, 410319, 407166, 406433, 404754, 409721, 409105, 402172,
    397489, 395612, 396305, 392898, 388272, 385597, 372591, 361338, 343466, 334802, 324720, 321930,
    322107, 324603, 329059, 336024, 347445, 350000, 326709, 321473, 308141, 301135, 299827, 302851,
    310528, 313294, 309968, 306174, 294002, 287194, 279863, 271535, 264951, 255548, 246581, 242228,
    233629, 229160, 222612, 213702, 211191, 212113, 173612, 161493, 148185, 129533, 122709, 109596,
    101343, 91817, 81825, 72631, 62803, 53030, 44521, 38226, 31777, 27030, 21868, 16548, 12198,
    8849, 6794, 4493, 6363,
];

/// ABS 3236.0 living arrangement propensities (1996), percent of each age bracket.
const PROPENSITIES_1996: [(HouseholdCategory, [f64; 18]); 8] = [
    (
        HouseholdCategory::PartneredWithChildren,
        [
            0.0, 0.0, 0.0, 0.7, 8.2, 28.5, 53.9, 66.2, 67.1, 59.7, 45.6, 30.8, 19.7, 12.1, 7.3,
            4.5, 2.7, 1.4,
        ],
    ),
    (
        HouseholdCategory::PartneredWithoutChildren,
        [
            0.0, 0.0, 0.0, 1.6, 14.5, 25.8, 16.5, 9.5, 10.1, 18.4, 32.5, 46.3, 54.4, 56.7, 53.6,
            45.1, 32.3, 15.5,
        ],
    ),
    (
        HouseholdCategory::MaleSingleParent,
        [
            0.0, 0.0, 0.0, 0.1, 0.1, 0.3, 0.5, 0.9, 1.4, 1.6, 1.4, 1.1, 0.9, 0.8, 0.8, 0.8, 0.9,
            1.0,
        ],
    ),
    (
        HouseholdCategory::FemaleSingleParent,
        [
            0.0, 0.0, 0.0, 0.7, 3.1, 4.5, 5.6, 6.5, 6.7, 5.7, 4.4, 3.4, 3.1, 3.1, 3.3, 3.7, 4.2,
            4.9,
        ],
    ),
    (
        HouseholdCategory::RelatedOtherFamily,
        [
            0.0, 0.0, 0.0, 2.1, 3.8, 2.2, 1.1, 0.7, 0.5, 0.5, 0.5, 0.7, 0.9, 1.2, 1.5, 1.7, 1.8,
            1.6,
        ],
    ),
    (
        HouseholdCategory::UnrelatedOtherFamily,
        [
            0.0, 0.0, 0.0, 4.5, 15.5, 10.4, 5.1, 2.9, 2.3, 2.1, 2.1, 2.0, 1.9, 1.8, 1.6, 1.5, 1.2,
            0.9,
        ],
    ),
    (
        HouseholdCategory::MaleLonePerson,
        [
            0.0, 0.0, 0.0, 0.8, 3.4, 5.1, 5.3, 5.0, 4.8, 4.8, 5.1, 5.6, 6.2, 6.9, 7.2, 7.9, 8.4,
            7.3,
        ],
    ),
    (
        HouseholdCategory::FemaleLonePerson,
        [
            0.0, 0.0, 0.0, 0.8, 2.9, 3.3, 2.9, 2.6, 2.8, 3.5, 4.8, 6.5, 9.2, 13.2, 18.8, 25.3,
            29.9, 25.5,
        ],
    ),
];

/// 1996 Census Basic Community Profile, table 26: households by occupants (2..6+).
const OTHER_FAMILY_SIZES_1996: [(u8, u64); 5] =
    [(2, 62_388), (3, 16_270), (4, 3_524), (5, 731), (6, 241)];
const OTHER_FAMILY_TOTAL_1996: u64 = 83_158;
const GROUP_HOUSEHOLD_SIZES_1996: [(u8, u64); 5] =
    [(2, 200_273), (3, 48_455), (4, 13_090), (5, 3_026), (6, 1_158)];
const GROUP_HOUSEHOLD_TOTAL_1996: u64 = 266_002;

/// 2021 Census: caravans, cabins, houseboats, improvised homes, tents and sleepers out.
const UNSUITABLE_DWELLINGS_2021: u64 = 94_925;
/// 2021 Census share of households renting.
const RENTING_FRACTION_2021: f64 = 0.306;
const HEALTHY_RENTAL_VACANCY_RATE: f64 = 0.03;
/// ABS Total Value of Dwellings: residential property transfers during 2024.
const PROPERTY_TRANSFERS_2024: u64 = 549_147;
const BALANCED_MONTHS_OF_INVENTORY: f64 = 6.0;

/// Australia at 30 June 2024, rolled forward from the 2021 Census.
///
/// The census fell 0.6 of the way through 2021 and the reference date halfway
/// through 2024; both fractions are the rounded values used in the source analysis.
/// Demolitions for 2021-2023 are unpublished and assumed to match 2024.
pub fn reference_2024() -> Scenario {
    let census_date = NaiveDate::from_ymd_opt(2021, 8, 10).expect("valid census date");
    let reference_date = NaiveDate::from_ymd_opt(2024, 6, 30).expect("valid reference date");

    let mut construction: Vec<AnnualConstruction> = QUARTERLY_GROSS_COMPLETIONS
        .iter()
        .map(|&(year, quarters)| AnnualConstruction::quarterly_gross(year, quarters))
        .collect();
    construction.push(AnnualConstruction::published_net(2024, COMPLETIONS_2024_NET));

    let propensities = PROPENSITIES_1996
        .iter()
        .map(|(category, row)| (*category, row.to_vec()))
        .collect();

    Scenario {
        label: "Australia, 30 June 2024".to_string(),
        baseline: CensusBaseline::new(census_date, CENSUS_DWELLINGS_2021)
            .with_elapsed(fraction(0.6)),
        target: ReferenceDate::new(reference_date).with_elapsed(fraction(0.5)),
        construction: ConstructionSeries::new(construction)
            .expect("reference construction years are ascending"),
        demolition: DemolitionAssumption::Observed(DemolitionObservation {
            year: 2024,
            gross: COMPLETIONS_2024_GROSS,
            net: COMPLETIONS_2024_NET,
        }),
        age_distribution: AgeDistribution::new(AGE_DISTRIBUTION_2024.to_vec())
            .expect("reference distribution covers ages 0 to 100+"),
        propensities: PropensityTable::new(1996, propensities),
        household_sizes: HouseholdSizeTables {
            other_family: HouseholdSizeTable::new(BTreeMap::from(OTHER_FAMILY_SIZES_1996))
                .with_published_total(OTHER_FAMILY_TOTAL_1996),
            group_household: HouseholdSizeTable::new(BTreeMap::from(GROUP_HOUSEHOLD_SIZES_1996))
                .with_published_total(GROUP_HOUSEHOLD_TOTAL_1996),
        },
        adjustments: AdjustmentInputs {
            unsuitable_dwellings: UNSUITABLE_DWELLINGS_2021,
            renting_fraction: RENTING_FRACTION_2021,
            healthy_vacancy_rate: HEALTHY_RENTAL_VACANCY_RATE,
            annual_property_transfers: PROPERTY_TRANSFERS_2024,
            months_of_inventory: BALANCED_MONTHS_OF_INVENTORY,
        },
    }
}

fn fraction(value: f64) -> YearFraction {
    YearFraction::new(value).expect("reference fractions lie within a year")
}
