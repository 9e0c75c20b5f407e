use std::{fs::File, path::PathBuf};

use csv::StringRecord;
use meter_domain::{MeterReading, RegionReading};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::pipeline::{Envelope, PipelineError, RecordStream, Source};

/// CSV replay source for region readings.
///
/// Expected header columns (by name, any order):
/// - ts (RFC3339 timestamp)
/// - region_id
/// - input_kwh
/// - output_kwh
pub struct ReadingCsvFileSource {
    path: PathBuf,
}

impl ReadingCsvFileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

fn parse_kwh(column: &str, raw: &str) -> Result<f64, PipelineError> {
    raw.trim()
        .parse()
        .map_err(|e| PipelineError::Source(format!("invalid {column} '{raw}': {e}")))
}

fn record_to_reading(
    record: &StringRecord,
    headers: &StringRecord,
) -> Result<RegionReading, PipelineError> {
    let get = |name: &str| -> Result<&str, PipelineError> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|idx| record.get(idx))
            .ok_or_else(|| PipelineError::Source(format!("missing column '{name}' in CSV record")))
    };

    let ts_str = get("ts")?;
    let timestamp = OffsetDateTime::parse(ts_str.trim(), &Rfc3339)
        .map_err(|e| PipelineError::Source(format!("invalid ts '{ts_str}': {e}")))?;

    Ok(RegionReading {
        region_id: get("region_id")?.trim().to_string(),
        reading: MeterReading::new(
            parse_kwh("input_kwh", get("input_kwh")?)?,
            parse_kwh("output_kwh", get("output_kwh")?)?,
            timestamp,
        ),
    })
}

#[async_trait::async_trait]
impl Source<RegionReading> for ReadingCsvFileSource {
    async fn stream(&self) -> RecordStream<RegionReading> {
        // Blocking reader inside one task; replay files are small.
        let path = self.path.clone();
        let s = async_stream::try_stream! {
            let file = File::open(&path)
                .map_err(|e| PipelineError::Source(format!("failed to open CSV file: {e}")))?;
            let mut rdr = csv::Reader::from_reader(file);
            let headers = rdr
                .headers()
                .map_err(|e| PipelineError::Source(format!("failed to read CSV headers: {e}")))?
                .clone();

            let mut seq: u64 = 0;
            for result in rdr.records() {
                seq += 1;
                let record = result.map_err(|e| PipelineError::Source(format!(
                    "failed to read CSV record {seq}: {e}"
                )))?;

                let reading = match record_to_reading(&record, &headers) {
                    Ok(r) => r,
                    Err(e) => {
                        metrics::counter!("reading_csv_parse_errors_total").increment(1);
                        Err(e)?
                    }
                };

                yield Envelope::new(reading, seq);
            }
        };

        Box::pin(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use time::macros::datetime;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn reads_readings_in_file_order() {
        let file = write_csv(
            "ts,region_id,input_kwh,output_kwh\n\
             2024-01-01T00:00:00Z,LDH-C,1250,1240\n\
             2024-01-01T01:00:00+05:30,JGR,1100,890\n",
        );

        let source = ReadingCsvFileSource::new(file.path());
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 2);

        let first = items[0].as_ref().unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(first.payload.region_id, "LDH-C");
        assert_eq!(first.payload.reading.input_kwh, 1250.0);
        assert_eq!(first.payload.reading.timestamp, datetime!(2024-01-01 00:00:00 UTC));

        let second = items[1].as_ref().unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.payload.reading.output_kwh, 890.0);
        assert_eq!(
            second.payload.reading.timestamp,
            datetime!(2024-01-01 01:00:00 +05:30)
        );
    }

    #[tokio::test]
    async fn column_order_does_not_matter() {
        let file = write_csv("region_id,output_kwh,ts,input_kwh\nKHN,1580,2024-01-01T00:00:00Z,1600\n");

        let source = ReadingCsvFileSource::new(file.path());
        let items: Vec<_> = source.stream().await.collect().await;
        let env = items[0].as_ref().unwrap();
        assert_eq!(env.payload.region_id, "KHN");
        assert_eq!(env.payload.reading.input_kwh, 1600.0);
        assert_eq!(env.payload.reading.output_kwh, 1580.0);
    }

    #[tokio::test]
    async fn bad_number_ends_stream_with_source_error() {
        let file = write_csv("ts,region_id,input_kwh,output_kwh\n2024-01-01T00:00:00Z,RKT,abc,650\n");

        let source = ReadingCsvFileSource::new(file.path());
        let items: Vec<_> = source.stream().await.collect().await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(PipelineError::Source(_))));
    }

    #[tokio::test]
    async fn missing_file_is_source_error() {
        let source = ReadingCsvFileSource::new("/nonexistent/readings.csv");
        let items: Vec<_> = source.stream().await.collect().await;
        assert!(matches!(items.as_slice(), [Err(PipelineError::Source(_))]));
    }
}
