use super::quota_writer::csv_error;
use crate::domain::subscription::{BillingCycle, SubscriptionPlan};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct PlanRow<'a> {
    plan: &'a str,
    name: &'a str,
    price: Decimal,
    currency: &'a str,
    billing_cycle: BillingCycle,
    quota_limit: f64,
}

pub struct PlanWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PlanWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_plans(&mut self, plans: &[SubscriptionPlan]) -> Result<()> {
        for plan in plans {
            self.writer
                .serialize(PlanRow {
                    plan: &plan.id,
                    name: &plan.name,
                    price: plan.price,
                    currency: &plan.currency,
                    billing_cycle: plan.billing_cycle,
                    quota_limit: plan.quota_limit,
                })
                .map_err(csv_error)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
