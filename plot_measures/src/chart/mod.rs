use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use plotters::prelude::*;

use crate::measures::Measure;

/// 输出图片尺寸，对应原始图表的 10x5 英寸 @150dpi
const WIDTH: u32 = 1500;
const HEIGHT: u32 = 750;

/// 带本地时间戳的输出路径，避免覆盖上一张图
pub fn timestamped_path(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%dT%H%M%S");
    dir.join(format!("energy_measures_{}.png", stamp))
}

/// 把所有措施画进一张折线图并落盘，返回保存路径
pub fn save(measures: &[Measure], out_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    let out_path = timestamped_path(out_dir);
    render(measures, &out_path)
        .with_context(|| format!("failed to render {}", out_path.display()))?;
    Ok(out_path)
}

fn render(measures: &[Measure], out_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(out_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let (y_min, y_max) = y_bounds(measures);
    let mut chart = ChartBuilder::on(&root)
        .caption("Measure impact profiles (24 hours)", ("sans-serif", 32))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(60)
        .build_cartesian_2d(0u32..23u32, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_labels(24)
        .x_desc("Hour of day")
        .y_desc("kWh impact (per-hour)")
        .draw()?;

    for (idx, measure) in measures.iter().enumerate() {
        let color = Palette99::pick(idx).mix(0.9);
        chart
            .draw_series(LineSeries::new(
                measure
                    .profile
                    .iter()
                    .enumerate()
                    .map(|(hour, value)| (hour as u32, *value)),
                color.stroke_width(2),
            ))?
            .label(&measure.name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 18, y)], color.stroke_width(2)));
        chart.draw_series(
            measure
                .profile
                .iter()
                .enumerate()
                .map(|(hour, value)| Circle::new((hour as u32, *value), 3, color.filled())),
        )?;
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// y 轴范围：数据上下各留一点边距，全平的数据也要能画
fn y_bounds(measures: &[Measure]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for measure in measures {
        for &value in &measure.profile {
            min = min.min(value);
            max = max.max(value);
        }
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let margin = ((max - min) * 0.05).max(0.1);
    (min - margin, max + margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn output_name_embeds_parseable_stamp() {
        let path = timestamped_path(Path::new("docs"));
        assert_eq!(path.parent(), Some(Path::new("docs")));

        let name = path.file_name().unwrap().to_str().unwrap();
        let stamp = name
            .strip_prefix("energy_measures_")
            .and_then(|rest| rest.strip_suffix(".png"))
            .unwrap();
        assert!(NaiveDateTime::parse_from_str(stamp, "%Y%m%dT%H%M%S").is_ok());
    }

    #[test]
    fn y_bounds_pad_the_data() {
        let measures = vec![Measure::new("m", (0..24).map(|h| 1.0 + h as f64 / 24.0).collect())];
        let (min, max) = y_bounds(&measures);
        assert!(min < 1.0);
        assert!(max > 1.0 + 23.0 / 24.0);
    }

    #[test]
    fn y_bounds_survive_flat_profiles() {
        let measures = vec![Measure::new("flat", vec![5.0; 24])];
        let (min, max) = y_bounds(&measures);
        assert!(min < 5.0 && 5.0 < max);
    }

    #[test]
    fn y_bounds_default_without_data() {
        assert_eq!(y_bounds(&[]), (0.0, 1.0));
    }
}
