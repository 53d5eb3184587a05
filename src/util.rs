use chrono::{Datelike, NaiveDate};
use crate::errors::{Result, StatsError};

// 日期转换工具
pub fn naive_date_to_int(date: &NaiveDate) -> i32 {
    date.year() * 10_000 + date.month() as i32 * 100 + date.day() as i32
}

pub fn int_to_naive_date(date_int: i32) -> Result<NaiveDate> {
    let date_str = date_int.to_string();
    if date_str.len() != 8 {
        return Err(StatsError::DataError(format!("Invalid date format: {}", date_str)));
    }

    let year = date_int / 10_000;
    let month = (date_int / 100 % 100) as u32;
    let day = (date_int % 100) as u32;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| StatsError::DataError(format!("Invalid date: {}-{}-{}", year, month, day)))
}

/// Parses `YYYY-MM-DD`.
pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")?)
}

/// Splits a comma separated ticker list, dropping blanks and upper-casing.
pub fn parse_symbol_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

// Arrow数据转换工具
pub mod arrow_utils {
    use super::*;
    use crate::models::price::{DailyBar, PriceSeries};
    use arrow::array::{ArrayRef, StringBuilder};
    use arrow::buffer::NullBuffer;
    use arrow::datatypes::{DataType, Field, Fields, Schema};
    use arrow::ipc::reader::FileReader;
    use arrow::ipc::writer::FileWriter;
    use arrow::record_batch::RecordBatch;
    use arrow_array::Array;
    use arrow_array::{Float64Array, Int32Array, Int64Array, ListArray, StringArray, StructArray};
    use log::info;
    use std::fs::File;
    use std::io::{Cursor, Read, Seek};
    use std::sync::Arc;

    fn arrow_err(e: impl std::fmt::Display) -> StatsError {
        StatsError::ArrowError(e.to_string())
    }

    fn daily_fields() -> Fields {
        Fields::from(vec![
            Field::new("date", DataType::Int32, false),
            Field::new("open", DataType::Float64, false),
            Field::new("high", DataType::Float64, false),
            Field::new("low", DataType::Float64, false),
            Field::new("close", DataType::Float64, false),
            Field::new("volume", DataType::Int64, false),
        ])
    }

    pub fn price_schema() -> Schema {
        Schema::new(vec![
            Field::new("symbol", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
            Field::new(
                "daily",
                DataType::List(Arc::new(Field::new(
                    "item",
                    DataType::Struct(daily_fields()),
                    false,
                ))),
                true,
            ),
        ])
    }

    // 将价格序列转换为Arrow记录批次
    pub fn series_to_record_batch(data: &[PriceSeries]) -> Result<RecordBatch> {
        let mut symbol_builder = StringBuilder::new();
        let mut name_builder = StringBuilder::new();

        let mut date_values = Vec::new();
        let mut open_values = Vec::new();
        let mut high_values = Vec::new();
        let mut low_values = Vec::new();
        let mut close_values = Vec::new();
        let mut volume_values = Vec::new();
        let mut offsets = vec![0i32];
        let mut validity = Vec::new();

        for series in data {
            symbol_builder.append_value(&series.symbol);
            name_builder.append_value(&series.name);

            for bar in &series.daily {
                date_values.push(naive_date_to_int(&bar.date));
                open_values.push(bar.open);
                high_values.push(bar.high);
                low_values.push(bar.low);
                close_values.push(bar.close);
                volume_values.push(bar.volume);
            }

            let last = offsets.last().copied().unwrap_or(0);
            offsets.push(last + series.daily.len() as i32);
            validity.push(true);
        }

        let struct_array = StructArray::try_new(
            daily_fields(),
            vec![
                Arc::new(Int32Array::from(date_values)),
                Arc::new(Float64Array::from(open_values)),
                Arc::new(Float64Array::from(high_values)),
                Arc::new(Float64Array::from(low_values)),
                Arc::new(Float64Array::from(close_values)),
                Arc::new(Int64Array::from(volume_values)),
            ],
            None,
        ).map_err(arrow_err)?;

        let offset_buffer = arrow::buffer::ScalarBuffer::from(offsets);
        let list_array = ListArray::try_new(
            Arc::new(Field::new("item", DataType::Struct(daily_fields()), false)),
            arrow::buffer::OffsetBuffer::new(offset_buffer),
            Arc::new(struct_array),
            Some(NullBuffer::from(validity)),
        ).map_err(arrow_err)?;

        let symbol_array: ArrayRef = Arc::new(symbol_builder.finish());
        let name_array: ArrayRef = Arc::new(name_builder.finish());
        let daily_array: ArrayRef = Arc::new(list_array);

        RecordBatch::try_new(
            Arc::new(price_schema()),
            vec![symbol_array, name_array, daily_array],
        )
        .map_err(arrow_err)
    }

    fn downcast<'a, T: 'static>(array: &'a dyn Array, what: &str) -> Result<&'a T> {
        array.as_any().downcast_ref::<T>()
            .ok_or_else(|| StatsError::ArrowError(format!("Failed to downcast {} column", what)))
    }

    fn read_bars(daily_struct: &StructArray) -> Result<Vec<DailyBar>> {
        let column = |name: &str| {
            daily_struct.column_by_name(name)
                .ok_or_else(|| StatsError::ArrowError(format!("Missing column {} in daily data", name)))
        };
        let dates = downcast::<Int32Array>(column("date")?.as_ref(), "date")?;
        let opens = downcast::<Float64Array>(column("open")?.as_ref(), "open")?;
        let highs = downcast::<Float64Array>(column("high")?.as_ref(), "high")?;
        let lows = downcast::<Float64Array>(column("low")?.as_ref(), "low")?;
        let closes = downcast::<Float64Array>(column("close")?.as_ref(), "close")?;
        let volumes = downcast::<Int64Array>(column("volume")?.as_ref(), "volume")?;

        (0..daily_struct.len())
            .map(|j| -> Result<DailyBar> {
                Ok(DailyBar {
                    date: int_to_naive_date(dates.value(j))?,
                    open: opens.value(j),
                    high: highs.value(j),
                    low: lows.value(j),
                    close: closes.value(j),
                    volume: volumes.value(j),
                })
            })
            .collect()
    }

    fn read_series<R: Read + Seek>(reader: R) -> Result<Vec<PriceSeries>> {
        let reader = FileReader::try_new(reader, None).map_err(arrow_err)?;
        let mut result = Vec::new();

        for batch in reader {
            let batch = batch.map_err(arrow_err)?;

            let symbol_array = downcast::<StringArray>(batch.column(0).as_ref(), "symbol")?;
            let name_array = downcast::<StringArray>(batch.column(1).as_ref(), "name")?;
            let daily_array = downcast::<ListArray>(batch.column(2).as_ref(), "daily")?;

            for i in 0..batch.num_rows() {
                let daily = if daily_array.is_null(i) {
                    Vec::new()
                } else {
                    let daily_list = daily_array.value(i);
                    let daily_struct = downcast::<StructArray>(daily_list.as_ref(), "daily struct")?;
                    read_bars(daily_struct)?
                };

                result.push(PriceSeries {
                    symbol: symbol_array.value(i).to_string(),
                    name: name_array.value(i).to_string(),
                    daily,
                });
            }
        }

        Ok(result)
    }

    // 从Arrow文件读取价格序列
    pub fn read_series_from_arrow(path: &str) -> Result<Vec<PriceSeries>> {
        let file = File::open(path)?;
        read_series(file)
    }

    // 从内存中读取Arrow数据
    pub fn read_series_from_memory(data: &[u8]) -> Result<Vec<PriceSeries>> {
        read_series(Cursor::new(data))
    }

    // 将价格序列保存到Arrow文件
    pub fn save_series_to_arrow(data: &[PriceSeries], path: &str) -> Result<()> {
        info!("Saving {} series to {}", data.len(), path);
        for series in data {
            info!("  - {} ({}): {} daily records", series.name, series.symbol, series.daily.len());
        }

        let batch = series_to_record_batch(data)?;
        let file = File::create(path)?;

        let mut writer = FileWriter::try_new(file, &batch.schema()).map_err(arrow_err)?;
        writer.write(&batch).map_err(arrow_err)?;
        writer.finish().map_err(arrow_err)?;

        Ok(())
    }
}
