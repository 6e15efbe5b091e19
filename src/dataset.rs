//! Headline dataset: CSV ingestion over HTTP or from disk, satire split,
//! class rebalancing and seeded train/test splits.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;
use url::Url;

use crate::error::{Error, Result};

/// 1 = the Onion, 0 = r/NotTheOnion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Label {
    NotOnion = 0,
    Onion = 1,
}

impl Label {
    pub const ALL: [Label; 2] = [Label::NotOnion, Label::Onion];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Label::NotOnion),
            1 => Some(Label::Onion),
            _ => None,
        }
    }

    /// Sentence shown to the user for a prediction.
    pub fn verdict(self) -> &'static str {
        match self {
            Label::Onion => "It's from the Onion!",
            Label::NotOnion => "It's not from the Onion!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Headline {
    pub text: String,
    pub label: Label,
}

impl Headline {
    pub fn new(text: impl Into<String>, label: Label) -> Self {
        Self {
            text: text.into(),
            label,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    headlines: Vec<Headline>,
}

/// True when `source` is an http(s) URL rather than a file path.
pub fn is_remote(source: &str) -> bool {
    Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

async fn fetch_csv_async(client: &reqwest::Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(body)
}

/// Download the CSV body at `url`.
pub fn fetch_csv(url: &str) -> Result<String> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let client = reqwest::Client::new();
        fetch_csv_async(&client, url).await
    })
}

impl Dataset {
    pub fn from_headlines(headlines: Vec<Headline>) -> Self {
        Self { headlines }
    }

    /// Load from an http(s) URL or a local path.
    pub fn load(source: &str) -> Result<Self> {
        let dataset = if is_remote(source) {
            info!(url = source, "fetching dataset");
            let body = fetch_csv(source)?;
            Self::from_csv_reader(body.as_bytes())?
        } else {
            info!(path = source, "reading dataset");
            Self::from_csv_reader(File::open(source)?)?
        };
        info!(
            rows = dataset.len(),
            onion = dataset.count(Label::Onion),
            not_onion = dataset.count(Label::NotOnion),
            "dataset loaded"
        );
        Ok(dataset)
    }

    /// Parse CSV with a header row. Columns are found by name (`text`,
    /// `label`); any other column, such as a leading unnamed index, is ignored.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };
        let text_col = column("text")?;
        let label_col = column("label")?;

        let mut headlines = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let text = record.get(text_col).unwrap_or_default();
            let raw_label = record.get(label_col).unwrap_or_default().trim();
            let label = raw_label
                .parse::<u8>()
                .ok()
                .and_then(Label::from_u8)
                .ok_or_else(|| Error::InvalidLabel {
                    row: i + 1,
                    value: raw_label.to_string(),
                })?;
            headlines.push(Headline::new(text, label));
        }

        if headlines.is_empty() {
            return Err(Error::EmptyDataset);
        }
        Ok(Self { headlines })
    }

    /// Write with a leading unnamed index column, then `text` and `label`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(["", "text", "label"])?;
        for (i, headline) in self.headlines.iter().enumerate() {
            writer.write_record([
                i.to_string(),
                headline.text.clone(),
                headline.label.as_u8().to_string(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    pub fn len(&self) -> usize {
        self.headlines.len()
    }

    pub fn headlines(&self) -> &[Headline] {
        &self.headlines
    }

    /// First `n` rows, for the preview table.
    pub fn head(&self, n: usize) -> &[Headline] {
        &self.headlines[..n.min(self.headlines.len())]
    }

    pub fn count(&self, label: Label) -> usize {
        self.headlines.iter().filter(|h| h.label == label).count()
    }

    /// Texts with the given label, in dataset order.
    pub fn texts_with(&self, label: Label) -> Vec<&str> {
        self.headlines
            .iter()
            .filter(|h| h.label == label)
            .map(|h| h.text.as_str())
            .collect()
    }

    /// Balance the classes: the larger class is downsampled to the size of
    /// the smaller one, majority rows come first, then everything is shuffled.
    ///
    /// The larger class is picked by count, whichever label it has. On the
    /// published raw data that is the real-news class (0); if Onion rows
    /// outnumber real ones it is the Onion class that gets cut instead.
    pub fn resample(&self, seed: u64) -> Result<Self> {
        let onion: Vec<&Headline> = self
            .headlines
            .iter()
            .filter(|h| h.label == Label::Onion)
            .collect();
        let not_onion: Vec<&Headline> = self
            .headlines
            .iter()
            .filter(|h| h.label == Label::NotOnion)
            .collect();
        if onion.is_empty() || not_onion.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let (mut majority, minority) = if onion.len() > not_onion.len() {
            (onion, not_onion)
        } else {
            (not_onion, onion)
        };

        let mut rng = StdRng::seed_from_u64(seed);
        majority.shuffle(&mut rng);
        majority.truncate(minority.len());

        let mut headlines: Vec<Headline> =
            majority.into_iter().chain(minority).cloned().collect();
        headlines.shuffle(&mut rng);
        info!(rows = headlines.len(), "dataset rebalanced");
        Ok(Self { headlines })
    }
}

fn check_fraction(name: &str, fraction: f64) -> Result<()> {
    if fraction > 0.0 && fraction < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{name} must be strictly between 0 and 1, got {fraction}"
        )))
    }
}

/// Shuffle with `seed`, then hold out `ceil(test_fraction * n)` items for
/// testing. Returns (train, test).
pub fn train_test_split<T: Clone>(
    items: &[T],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>)> {
    check_fraction("test fraction", test_fraction)?;
    let mut shuffled = items.to_vec();
    shuffled.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_test = (test_fraction * items.len() as f64).ceil() as usize;
    let train = shuffled.split_off(n_test);
    Ok((train, shuffled))
}

/// Shuffle with `seed`, then keep the first `round(train_fraction * n)`
/// items for training. Returns (train, test).
pub fn fixed_size_split<T>(
    mut items: Vec<T>,
    train_fraction: f64,
    seed: u64,
) -> Result<(Vec<T>, Vec<T>)> {
    check_fraction("train fraction", train_fraction)?;
    items.shuffle(&mut StdRng::seed_from_u64(seed));
    let n_train = (train_fraction * items.len() as f64).round() as usize;
    let test = items.split_off(n_train);
    Ok((items, test))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = ",text,label\n\
        0,Area Man Wins Lottery,1\n\
        1,\"Senate Passes Bill, Again\",0\n\
        2,Nation Shocked,1\n";

    fn sample(onion: usize, not_onion: usize) -> Dataset {
        let mut headlines = Vec::new();
        for i in 0..onion {
            headlines.push(Headline::new(format!("onion {i}"), Label::Onion));
        }
        for i in 0..not_onion {
            headlines.push(Headline::new(format!("real {i}"), Label::NotOnion));
        }
        Dataset::from_headlines(headlines)
    }

    #[test]
    fn test_parse_drops_index_column() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.headlines()[0], Headline::new("Area Man Wins Lottery", Label::Onion));
        assert_eq!(ds.headlines()[1].text, "Senate Passes Bill, Again");
        assert_eq!(ds.count(Label::Onion), 2);
        assert_eq!(ds.texts_with(Label::NotOnion), vec!["Senate Passes Bill, Again"]);
    }

    #[test]
    fn test_parse_without_index_column() {
        let ds = Dataset::from_csv_reader("label,text\n0,hello world\n".as_bytes()).unwrap();
        assert_eq!(ds.headlines(), &[Headline::new("hello world", Label::NotOnion)]);
    }

    #[test]
    fn test_parse_rejects_bad_label() {
        let err = Dataset::from_csv_reader(",text,label\n0,a,1\n1,b,2\n".as_bytes()).unwrap_err();
        match err {
            Error::InvalidLabel { row, value } => {
                assert_eq!(row, 2);
                assert_eq!(value, "2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_missing_column_and_empty() {
        let err = Dataset::from_csv_reader("headline,label\nx,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MissingColumn(ref c) if c == "text"));
        let err = Dataset::from_csv_reader(",text,label\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn test_head() {
        let ds = sample(3, 4);
        assert_eq!(ds.head(5).len(), 5);
        assert_eq!(ds.head(100).len(), 7);
    }

    #[test]
    fn test_resample_balances_classes() {
        let ds = sample(30, 80);
        let balanced = ds.resample(0).unwrap();
        assert_eq!(balanced.len(), 60);
        assert_eq!(balanced.count(Label::Onion), 30);
        assert_eq!(balanced.count(Label::NotOnion), 30);
        assert_eq!(ds.resample(0).unwrap().headlines(), balanced.headlines());
    }

    #[test]
    fn test_resample_cuts_onion_when_it_is_larger() {
        let ds = sample(80, 30);
        let balanced = ds.resample(7).unwrap();
        assert_eq!(balanced.count(Label::Onion), 30);
        assert_eq!(balanced.count(Label::NotOnion), 30);
        let mut real = balanced.texts_with(Label::NotOnion);
        real.sort();
        let mut expected = ds.texts_with(Label::NotOnion);
        expected.sort();
        assert_eq!(real, expected);
    }

    #[test]
    fn test_resample_needs_both_classes() {
        assert!(matches!(sample(5, 0).resample(0), Err(Error::EmptyDataset)));
    }

    #[test]
    fn test_train_test_split_sizes_and_determinism() {
        let items: Vec<usize> = (0..10).collect();
        let (train, test) = train_test_split(&items, 0.25, 69).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 7);
        let mut all: Vec<usize> = train.iter().chain(test.iter()).copied().collect();
        all.sort();
        assert_eq!(all, items);
        assert_eq!(train_test_split(&items, 0.25, 69).unwrap(), (train, test));
    }

    #[test]
    fn test_fixed_size_split() {
        let items: Vec<usize> = (0..18000).collect();
        let (train, test) = fixed_size_split(items, 0.7, 0).unwrap();
        assert_eq!(train.len(), 12600);
        assert_eq!(test.len(), 5400);
    }

    #[test]
    fn test_split_rejects_bad_fraction() {
        assert!(matches!(
            train_test_split(&[1, 2, 3], 1.0, 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            fixed_size_split(vec![1, 2, 3], 0.0, 0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_write_then_read() {
        let ds = Dataset::from_csv_reader(CSV.as_bytes()).unwrap();
        let file = tempfile::NamedTempFile::new().unwrap();
        ds.save(file.path()).unwrap();
        let reloaded = Dataset::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(reloaded.headlines(), ds.headlines());
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/data.csv"));
        assert!(is_remote("http://localhost:8000/x.csv"));
        assert!(!is_remote("data/onion.csv"));
        assert!(!is_remote("/tmp/onion.csv"));
        assert!(!is_remote("file:///tmp/onion.csv"));
    }

    #[test]
    fn test_label_roundtrip() {
        for label in Label::ALL {
            assert_eq!(Label::from_u8(label.as_u8()), Some(label));
        }
        assert_eq!(Label::from_u8(2), None);
        assert_eq!(Label::Onion.verdict(), "It's from the Onion!");
    }
}
