//! Console rendering of plans as stanza tables.

use stanza::style::{HAlign, Header, MinWidth, Styles};
use stanza::table::{Col, Row, Table};

use crate::plan::{GameweekPlan, Solution};

fn money(tenths: f64) -> String {
    format!("{:.1}", tenths / 10.0)
}

/// One row per planned gameweek: chip, transfer traffic, hits, bank and the
/// week's expected points.
pub fn tabulate_horizon(solution: &Solution) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(28)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(5)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(7)).with(HAlign::Right)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "GW".into(),
                "Chip".into(),
                "FTs".into(),
                "Transfers".into(),
                "Hits".into(),
                "Bank".into(),
                "xPts".into(),
            ],
        ));
    for plan in &solution.plans {
        let chip = plan
            .chip
            .map(|chip| chip.to_string())
            .unwrap_or_else(|| "-".into());
        let traffic = if plan.transfers_made == 0 {
            "-".into()
        } else {
            let outs: Vec<&str> = plan
                .transfers_out
                .iter()
                .map(|departure| departure.name.as_str())
                .collect();
            let ins: Vec<&str> = plan
                .picks
                .iter()
                .filter(|pick| pick.transfer_in)
                .map(|pick| pick.name.as_str())
                .collect();
            format!("{} > {}", outs.join(", "), ins.join(", "))
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                format!("{}", plan.gameweek).into(),
                chip.into(),
                format!("{}", plan.free_transfers).into(),
                traffic.into(),
                format!("{}", plan.hits).into(),
                money(plan.bank).into(),
                format!("{:.2}", plan.expected_points).into(),
            ],
        ));
    }
    table
}

/// The full squad sheet for one gameweek, lineup first, bench in order.
pub fn tabulate_gameweek(plan: &GameweekPlan) -> Table {
    let mut table = Table::default()
        .with_cols(vec![
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Centred)),
            Col::new(Styles::default().with(MinWidth(18)).with(HAlign::Left)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(6)).with(HAlign::Right)),
            Col::new(Styles::default().with(MinWidth(4)).with(HAlign::Centred)),
        ])
        .with_row(Row::new(
            Styles::default().with(Header(true)),
            vec![
                "Slot".into(),
                "Pos".into(),
                "Player".into(),
                "Price".into(),
                "xP".into(),
                "".into(),
            ],
        ));
    for pick in &plan.picks {
        let slot = match pick.bench_slot {
            Some(slot) => format!("B{}", slot + 1),
            None => "XI".into(),
        };
        let badge = if pick.captain {
            if pick.multiplier == 3 {
                "TC"
            } else {
                "C"
            }
        } else if pick.vice_captain {
            "V"
        } else if pick.transfer_in {
            "+"
        } else {
            ""
        };
        table.push_row(Row::new(
            Styles::default(),
            vec![
                slot.into(),
                pick.position.to_string().into(),
                pick.name.clone().into(),
                money(pick.price as f64).into(),
                format!("{:.2}", pick.expected_points).into(),
                badge.into(),
            ],
        ));
    }
    table
}
