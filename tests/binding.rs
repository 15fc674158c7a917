#[cfg(test)]
mod tests {
    use futures::{StreamExt, TryStreamExt, stream};
    use quarry::{Binder, Entity, RowLabeled, RowNames, Value, checksum};
    use rust_decimal::Decimal;
    use std::{str::FromStr, sync::Arc};
    use time::{PrimitiveDateTime, macros::datetime};

    #[derive(Entity, Debug, Clone, PartialEq)]
    #[quarry(name = "SpecialOffer")]
    struct SpecialOffer {
        #[quarry(name = "SpecialOfferID", identifier)]
        id: i32,
        #[quarry(name = "Description", size = 255)]
        description: String,
        #[quarry(name = "DiscountPct")]
        discount: Decimal,
        #[quarry(name = "MaxQty")]
        max_quantity: Option<i32>,
        #[quarry(name = "StartDate")]
        start: PrimitiveDateTime,
        #[quarry(checksum)]
        checksum: Option<u64>,
    }

    fn labels() -> RowNames {
        ["SpecialOfferID", "Description", "DiscountPct", "MaxQty", "StartDate"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn row(id: i64, description: &str) -> RowLabeled {
        RowLabeled::new(
            labels(),
            [
                Value::Int64(Some(id)),
                Value::Varchar(Some(description.into())),
                Value::Varchar(Some("0.15".into())),
                Value::Null,
                Value::Varchar(Some("2014-03-31 00:00:00.0".into())),
            ]
            .into(),
        )
    }

    #[test]
    fn provider_values_are_converted() {
        let offer: SpecialOffer = Binder::bind_row(row(7, "Mountain-100 Clearance")).expect("Bound");
        assert_eq!(offer.id, 7);
        assert_eq!(offer.description, "Mountain-100 Clearance");
        assert_eq!(offer.discount, Decimal::from_str("0.15").expect("Decimal"));
        assert_eq!(offer.max_quantity, None);
        assert_eq!(offer.start, datetime!(2014-03-31 00:00:00));
        assert_eq!(offer.checksum, Some(checksum(&offer).expect("Checksum")));
    }

    #[test]
    fn checksum_follows_the_values() {
        let a: SpecialOffer = Binder::bind_row(row(1, "Volume Discount")).expect("Bound");
        let mut b: SpecialOffer = Binder::bind_row(row(1, "Volume Discount")).expect("Bound");
        assert_eq!(a.checksum, b.checksum);
        b.description = "No Discount".into();
        assert_ne!(checksum(&b).expect("Checksum"), a.checksum.expect("Tracked"));
    }

    #[test]
    fn missing_columns() {
        // Optional fields tolerate a missing column
        let labels: RowNames = Arc::from(
            ["SpecialOfferID", "Description", "DiscountPct", "StartDate"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>(),
        );
        let values = [
            Value::Int32(Some(2)),
            Value::Varchar(Some("Seasonal".into())),
            Value::Decimal(Some(Decimal::new(5, 2)), 0, 0),
            Value::Timestamp(Some(datetime!(2013-05-30 00:00:00))),
        ];
        let offer: SpecialOffer =
            Binder::bind_row(RowLabeled::new(labels, values.into())).expect("Bound");
        assert_eq!(offer.max_quantity, None);

        let labels: RowNames = Arc::from(vec!["SpecialOfferID".to_string()]);
        let error = SpecialOffer::from_row(RowLabeled::new(labels, [Value::Int32(Some(3))].into()))
            .expect_err("Description is required");
        assert!(format!("{error:#}").contains("Description"));
    }

    #[test]
    fn wrong_types_fail() {
        let mut broken = row(4, "Touring");
        broken.values[0] = Value::Varchar(Some("four".into()));
        let error = Binder::bind_row::<SpecialOffer>(broken).expect_err("Not a number");
        assert!(format!("{error:#}").contains("SpecialOfferID"));

        let mut broken = row(5, "Touring");
        broken.values[0] = Value::Int64(Some(i64::MAX));
        assert!(Binder::bind_row::<SpecialOffer>(broken).is_err(), "Out of range for i32");
    }

    #[tokio::test]
    async fn stream_binding() {
        let rows = stream::iter((1..=3).map(|i| Ok(row(i, "Batch"))));
        let offers: Vec<SpecialOffer> = Binder::bind(rows).try_collect().await.expect("Bound");
        assert_eq!(offers.iter().map(|v| v.id).collect::<Vec<_>>(), [1, 2, 3]);

        let rows = stream::iter([Ok(row(1, "Fine")), Err(quarry::Error::msg("Broken pipe"))]);
        let results: Vec<_> = Binder::bind::<SpecialOffer, _>(rows).collect().await;
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
