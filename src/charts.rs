use std::path::Path;

use plotters::element::Pie;
use plotters::prelude::*;

use crate::error::Result;

const PURPLE: RGBColor = RGBColor(128, 0, 128);
const GREY: RGBColor = RGBColor(128, 128, 128);
const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const POSITIVE_GREEN: RGBColor = RGBColor(0x66, 0xc2, 0xa5);
const NEGATIVE_ORANGE: RGBColor = RGBColor(0xfc, 0x8d, 0x62);

/// Window score over window index, with a zero reference line.
pub fn draw_emotion_curve(path: &Path, scores: &[i64], font: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let low = scores.iter().copied().min().unwrap_or(0).min(0) - 1;
    let high = scores.iter().copied().max().unwrap_or(0).max(0) + 1;
    let last_index = (scores.len() as i64 - 1).max(1);

    let mut chart = ChartBuilder::on(&root)
        .caption(
            "基于NTUSD的文本情绪曲线（正数偏积极，负数偏消极）",
            (font, 24.0).into_font(),
        )
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0i64..last_index, low..high)?;

    chart
        .configure_mesh()
        .x_desc("文本段编号")
        .y_desc("情绪得分")
        .axis_desc_style((font, 16.0).into_font())
        .draw()?;

    chart.draw_series(LineSeries::new(vec![(0, 0), (last_index, 0)], &GREY))?;
    chart.draw_series(
        LineSeries::new(
            scores.iter().enumerate().map(|(i, score)| (i as i64, *score)),
            &PURPLE,
        )
        .point_size(3),
    )?;

    root.present()?;
    Ok(())
}

pub fn draw_emotion_pie(path: &Path, positive: usize, negative: usize, font: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (600, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled("NTUSD情绪词占比", (font, 24.0).into_font())?;

    let (width, height) = area.dim_in_pixel();
    let center = ((width / 2) as i32, (height / 2) as i32);
    let radius = width.min(height) as f64 * 0.35;
    let sizes = [positive as f64, negative as f64];
    let colors = [POSITIVE_GREEN, NEGATIVE_ORANGE];
    let labels = ["正向情绪词", "负向情绪词"];

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style((font, 18.0).into_font().color(&BLACK));
    pie.percentages((font, 16.0).into_font().color(&BLACK));
    area.draw(&pie)?;

    root.present()?;
    Ok(())
}

/// Exclusive top of the count axis, with 10% headroom over the tallest bar.
fn count_axis_top(terms: &[(String, usize)]) -> u64 {
    let max_count = terms.iter().map(|(_, count)| *count as u64).max().unwrap_or(0);
    max_count + max_count / 10 + 1
}

/// Bars for the most frequent terms, labels rotated under the axis.
pub fn draw_top_words_bar(path: &Path, terms: &[(String, usize)], font: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (1200, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("高频词统计前{}", terms.len()), (font, 24.0).into_font())
        .margin(15)
        .x_label_area_size(100)
        .y_label_area_size(60)
        .build_cartesian_2d(
            (0u32..terms.len() as u32).into_segmented(),
            0u64..count_axis_top(terms),
        )?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(terms.len())
        .x_label_formatter(&|value| match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => terms
                .get(*i as usize)
                .map(|(term, _)| term.clone())
                .unwrap_or_default(),
            SegmentValue::Last => String::new(),
        })
        .x_label_style((font, 14.0).into_font().transform(FontTransform::Rotate90))
        .y_desc("词频")
        .axis_desc_style((font, 16.0).into_font())
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(SKY_BLUE.filled())
            .margin(6)
            .data(
                terms
                    .iter()
                    .enumerate()
                    .map(|(i, (_, count))| (i as u32, *count as u64)),
            ),
    )?;

    root.present()?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ClusterPoint {
    pub x: f64,
    pub y: f64,
    pub cluster: usize,
    pub label: String,
}

/// Documents in the plane of the first two topic weights, coloured by cluster.
pub fn draw_topic_clusters(path: &Path, points: &[ClusterPoint], font: &str) -> Result<()> {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("文档主题分布聚类可视化", (font, 24.0).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.05f64..1.05f64, -0.05f64..1.05f64)?;

    chart
        .configure_mesh()
        .x_desc("主题1权重")
        .y_desc("主题2权重")
        .axis_desc_style((font, 16.0).into_font())
        .draw()?;

    chart.draw_series(points.iter().map(|point| {
        EmptyElement::at((point.x, point.y))
            + Circle::new((0, 0), 6, Palette99::pick(point.cluster).filled())
            + Text::new(point.label.clone(), (8, -8), (font, 14.0).into_font())
    }))?;

    root.present()?;
    Ok(())
}
