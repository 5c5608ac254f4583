/// Per-exchange column alias tables.
///
/// Each canonical field lists every column label the exchange has used for
/// it, in priority order. When two aliases of the same field appear in one
/// export, the earlier entry wins. Labels are compared after header
/// normalization, ignoring ASCII case. Adding a historical column name is an
/// edit to these tables only.
use rust_decimal::Decimal;

use super::normalizer::normalize_header;
use crate::types::Exchange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    SecurityCode,
    IssuerName,
    CouponRate,
    MaturityDate,
    Ltp,
    TurnoverRsLacs,
    NoOfTrades,
    BondType,
    FaceValue,
    CreditRating,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::SecurityCode,
        CanonicalField::IssuerName,
        CanonicalField::CouponRate,
        CanonicalField::MaturityDate,
        CanonicalField::Ltp,
        CanonicalField::TurnoverRsLacs,
        CanonicalField::NoOfTrades,
        CanonicalField::BondType,
        CanonicalField::FaceValue,
        CanonicalField::CreditRating,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            CanonicalField::SecurityCode => "security_code",
            CanonicalField::IssuerName => "issuer_name",
            CanonicalField::CouponRate => "coupon_rate",
            CanonicalField::MaturityDate => "maturity_date",
            CanonicalField::Ltp => "ltp",
            CanonicalField::TurnoverRsLacs => "turnover_rs_lacs",
            CanonicalField::NoOfTrades => "no_of_trades",
            CanonicalField::BondType => "bond_type",
            CanonicalField::FaceValue => "face_value",
            CanonicalField::CreditRating => "credit_rating",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

#[derive(Debug)]
pub struct FieldAliases {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
}

#[derive(Debug)]
pub struct SourceSchema {
    pub exchange: Exchange,
    pub fields: &'static [FieldAliases],
    /// Factor converting the exchange's native turnover unit to lakhs
    pub turnover_multiplier: i64,
}

const BSE_FIELDS: &[FieldAliases] = &[
    FieldAliases {
        field: CanonicalField::SecurityCode,
        aliases: &["Security Code", "Scrip Code", "Scrip Name", "Symbol"],
    },
    FieldAliases {
        field: CanonicalField::IssuerName,
        aliases: &["Issuer Name", "Security Name", "Scrip Long Name", "Company Name"],
    },
    FieldAliases {
        field: CanonicalField::CouponRate,
        aliases: &["Coupon Rate", "Coupon Rate (%)", "Coupon (%)", "Coupon"],
    },
    FieldAliases {
        field: CanonicalField::MaturityDate,
        aliases: &["Maturity Date", "Date of Maturity", "Redemption Date"],
    },
    FieldAliases {
        field: CanonicalField::Ltp,
        aliases: &["LTP", "Last Traded Price", "Close Price", "Close"],
    },
    FieldAliases {
        field: CanonicalField::TurnoverRsLacs,
        aliases: &[
            "Turnover (Rs. Lakhs)",
            "Total Trade Turnover (Rs. Lakhs)",
            "Turnover (Rs. Lakh)",
            "Turnover (Rs. Lacs)",
            "Value (Rs. Lakhs)",
        ],
    },
    FieldAliases {
        field: CanonicalField::NoOfTrades,
        aliases: &["No. of Trades", "No of Trades", "Number of Trades", "Total Trade Volume"],
    },
    FieldAliases {
        field: CanonicalField::BondType,
        aliases: &["Bond Type", "Instrument Type", "Type"],
    },
    FieldAliases {
        field: CanonicalField::FaceValue,
        aliases: &["Face Value", "Face Value (Rs.)", "FV"],
    },
    FieldAliases {
        field: CanonicalField::CreditRating,
        aliases: &["Credit Rating", "Rating"],
    },
];

const NSE_FIELDS: &[FieldAliases] = &[
    FieldAliases {
        field: CanonicalField::SecurityCode,
        aliases: &["Symbol", "ISIN", "ISIN Code", "Security"],
    },
    FieldAliases {
        field: CanonicalField::IssuerName,
        aliases: &["Issuer Name", "Company Name", "Issue Description", "Description"],
    },
    FieldAliases {
        field: CanonicalField::CouponRate,
        aliases: &["Coupon Rate", "Coupon Rate (%)", "Coupon"],
    },
    FieldAliases {
        field: CanonicalField::MaturityDate,
        aliases: &["Maturity Date", "Redemption Date", "Maturity"],
    },
    FieldAliases {
        field: CanonicalField::Ltp,
        aliases: &["LTP", "Last Traded Price", "Close Price", "Last Price"],
    },
    FieldAliases {
        field: CanonicalField::TurnoverRsLacs,
        aliases: &[
            "Turnover (Rs. Crores)",
            "Turnover (Rs. Cr.)",
            "Value (Rs. Crores)",
            "Traded Value (Rs. Cr.)",
            "Turnover",
        ],
    },
    FieldAliases {
        field: CanonicalField::NoOfTrades,
        aliases: &["No. of Trades", "Number of Trades", "No of Trades", "Trades"],
    },
    FieldAliases {
        field: CanonicalField::BondType,
        aliases: &["Series", "Bond Type", "Instrument Type"],
    },
    FieldAliases {
        field: CanonicalField::FaceValue,
        aliases: &["Face Value", "Face Value (Rs.)", "FV"],
    },
    FieldAliases {
        field: CanonicalField::CreditRating,
        aliases: &["Credit Rating", "Rating"],
    },
];

pub static BSE_SCHEMA: SourceSchema = SourceSchema {
    exchange: Exchange::Bse,
    fields: BSE_FIELDS,
    turnover_multiplier: 1,
};

/// NSE turnover is requested in crores; 1 crore = 100 lakhs
pub static NSE_SCHEMA: SourceSchema = SourceSchema {
    exchange: Exchange::Nse,
    fields: NSE_FIELDS,
    turnover_multiplier: 100,
};

pub fn schema_for(exchange: Exchange) -> &'static SourceSchema {
    match exchange {
        Exchange::Bse => &BSE_SCHEMA,
        Exchange::Nse => &NSE_SCHEMA,
    }
}

/// Column index per canonical field, resolved against one header row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; 10],
}

impl ColumnMap {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        self.indices[field.index()]
    }

    pub fn mapped_count(&self) -> usize {
        self.indices.iter().filter(|i| i.is_some()).count()
    }
}

impl SourceSchema {
    pub fn aliases(&self, field: CanonicalField) -> &'static [&'static str] {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| f.aliases)
            .unwrap_or(&[])
    }

    pub fn turnover_multiplier(&self) -> Decimal {
        Decimal::from(self.turnover_multiplier)
    }

    /// Map canonical fields onto positions in already-normalized `headers`
    pub fn resolve_columns(&self, headers: &[String]) -> ColumnMap {
        let mut map = ColumnMap::default();

        for entry in self.fields {
            map.indices[entry.field.index()] = entry.aliases.iter().find_map(|alias| {
                let alias = normalize_header(alias);
                headers.iter().position(|h| h.eq_ignore_ascii_case(&alias))
            });
        }

        map
    }
}
